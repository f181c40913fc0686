// Machine
mod decode;
pub use decode::{sign_extend, Opcode};
mod memory;
pub use memory::{Memory, KBDR, KBSR, MEMORY_MAX};
mod register;
pub use register::{Flag, Registers};
mod runtime;
pub use runtime::{RunState, Status, TrapVect, INTERRUPT_INTERVAL};

// Loading
mod image;
pub use image::Image;
mod error;
pub use error::{LoadError, RuntimeError};

// Devices
pub mod device;
pub mod term;

pub mod env;
pub mod output;
