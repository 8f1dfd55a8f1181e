//! Buffered driver library for the Solomon Systech SSD1322 dot matrix OLED display driver.
//!
//! Drawing happens in a local 4-bit grayscale `FrameBuffer`, which is also an `embedded-graphics`
//! draw target. `Display::show` sends the whole buffer to the panel.
//!
//! ```no_run
//! # use embedded_hal_mock::{delay::MockNoop, pin, spi, MockError};
//! # use ssd1322_fb::interface::spi::SpiInterfaceError;
//! use ssd1322_fb::{consts, Display, SpiInterface};
//! # fn main() -> Result<(), ssd1322_fb::Error<SpiInterfaceError<MockError, MockError>, MockError>> {
//! # let spi = spi::Mock::new(&[]);
//! # let (dc, cs, rst) = (pin::Mock::new(&[]), pin::Mock::new(&[]), pin::Mock::new(&[]));
//! # let mut delay = MockNoop::new();
//!
//! let iface = SpiInterface::new(spi, dc, cs);
//! let mut disp = Display::new(
//!     iface,
//!     rst,
//!     &mut delay,
//!     consts::DEFAULT_WIDTH,
//!     consts::DEFAULT_HEIGHT,
//! )?;
//!
//! disp.draw_text("Hello", 0, 0);
//! disp.draw_line(0, 12, 255, 12, 8);
//! disp.show()?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;


pub mod command;
pub mod config;
pub mod display;
pub mod error;
pub mod framebuffer;
pub mod interface;

// Re-exports for primary API.
pub use crate::command::{consts, ComLayout, ComScanDirection, DisplayMode, GpioMode};
pub use crate::config::{Config, GrayScaleTable};
pub use crate::display::Display;
pub use crate::error::Error;
pub use crate::framebuffer::FrameBuffer;
pub use crate::interface::spi::SpiInterface;
pub use crate::interface::DisplayInterface;
