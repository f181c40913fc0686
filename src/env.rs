use std::cell::Cell;

const MINIMAL_VAR: &str = "LC3VM_MINIMAL";
const TRACE_VAR: &str = "LC3VM_TRACE";

/// Settings taken from environment variables, each enabled by the value `1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Env {
    /// `LC3VM_MINIMAL`
    pub minimal: bool,
    /// `LC3VM_TRACE`
    pub trace: bool,
}

impl Env {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = |name| lookup(name).is_some_and(|value| value == "1");
        Self {
            minimal: enabled(MINIMAL_VAR),
            trace: enabled(TRACE_VAR),
        }
    }
}

thread_local! {
    static ENV: Cell<Option<Env>> = const { Cell::new(None) };
}

/// Read configuration from the process environment. Must only be called once.
pub fn init() {
    install(Env::from_lookup(|name| std::env::var(name).ok()));
}

fn install(env: Env) {
    let previous = ENV.replace(Some(env));
    assert!(
        previous.is_none(),
        "tried to initialize environment state multiple times"
    );
}

/// Panics if [`init`] has not been called on this thread.
pub fn get() -> Env {
    ENV.get()
        .unwrap_or_else(|| panic!("tried to access environment state before initialization"))
}

pub fn is_minimal() -> bool {
    get().minimal
}

pub fn is_trace() -> bool {
    get().trace
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn only_one_enables() {
        let env = Env::from_lookup(lookup(&[("LC3VM_MINIMAL", "1"), ("LC3VM_TRACE", "yes")]));
        assert_eq!(
            env,
            Env {
                minimal: true,
                trace: false,
            }
        );
        assert_eq!(Env::from_lookup(lookup(&[])), Env::default());
    }

    #[test]
    fn installed_per_thread() {
        // Each test runs on its own thread, so state starts empty
        install(Env {
            minimal: true,
            trace: false,
        });
        assert!(is_minimal());
        assert!(!is_trace());
    }

    #[test]
    #[should_panic(expected = "multiple times")]
    fn init_twice_panics() {
        init();
        init();
    }

    #[test]
    #[should_panic(expected = "before initialization")]
    fn get_before_init_panics() {
        get();
    }
}
