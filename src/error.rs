//! Errors returned by the display driver. Failures of the collaborators (the display interface and
//! the reset pin) are passed through unchanged inside the variants.

use crate::command::CommandError;

/// An error from a `Display` operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<CommE, PinE> {
    /// The display interface failed to transmit a command or data.
    Comm(CommE),
    /// The reset pin could not be driven.
    Pin(PinE),
    /// A register argument, usually derived from the display geometry, cannot be encoded by the
    /// SSD1322.
    OutOfRange,
}

impl<CommE, PinE> From<CommandError<CommE>> for Error<CommE, PinE> {
    fn from(e: CommandError<CommE>) -> Self {
        match e {
            CommandError::Interface(e) => Error::Comm(e),
            CommandError::OutOfRange => Error::OutOfRange,
        }
    }
}
