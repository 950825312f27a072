pub mod epoch_command;
pub mod genesis_command;
pub mod inspect_command;

pub use self::{epoch_command::*, genesis_command::*, inspect_command::*};
