//! The main API to the display driver. A `Display` owns a `FrameBuffer` that all drawing goes to;
//! nothing reaches the panel until `show` transfers the whole buffer.
//!
//! The driver keeps no record of the controller's state. Every method writes its registers
//! unconditionally, so a panel that was reset or browned out behind the driver's back is brought
//! back by re-running `init_display`.

use core::convert::{Infallible, TryFrom};

use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use log::{debug, trace};

use crate::command::consts::*;
use crate::command::*;
use crate::config::Config;
use crate::error::Error;
use crate::framebuffer::{FrameBuffer, MAX_LEVEL};
use crate::interface;

/// Drive the active-low reset line through a reset pulse: high for 1ms, low for 10ms, then high.
fn pulse_reset<RST, DELAY>(rst: &mut RST, delay: &mut DELAY) -> Result<(), RST::Error>
where
    RST: OutputPin,
    DELAY: DelayMs<u8>,
{
    rst.set_high()?;
    delay.delay_ms(1);
    rst.set_low()?;
    delay.delay_ms(10);
    rst.set_high()
}

/// A driver for an SSD1322 display.
pub struct Display<DI, RST>
where
    DI: interface::DisplayInterface,
    RST: OutputPin,
{
    iface: DI,
    rst: RST,
    frame: FrameBuffer,
    config: Config,
}

impl<DI, RST> Display<DI, RST>
where
    DI: interface::DisplayInterface,
    RST: OutputPin,
{
    /// Construct a new display driver for a panel of `width` x `height` pixels (typically
    /// `consts::DEFAULT_WIDTH` x `consts::DEFAULT_HEIGHT`) which is connected to the interface
    /// `iface`, with its reset line on `rst`. The panel is reset, initialized with
    /// `Config::default()`, and cleared. The geometry is not validated here; see `show`.
    pub fn new<DELAY>(
        iface: DI,
        rst: RST,
        delay: &mut DELAY,
        width: u16,
        height: u16,
    ) -> Result<Self, Error<DI::Error, RST::Error>>
    where
        DELAY: DelayMs<u8>,
    {
        Self::with_config(iface, rst, delay, width, height, Config::default())
    }

    /// Like `new`, with the init sequence register values taken from `config`.
    pub fn with_config<DELAY>(
        iface: DI,
        rst: RST,
        delay: &mut DELAY,
        width: u16,
        height: u16,
        config: Config,
    ) -> Result<Self, Error<DI::Error, RST::Error>>
    where
        DELAY: DelayMs<u8>,
    {
        let mut disp = Display {
            iface,
            rst,
            frame: FrameBuffer::new(width, height),
            config,
        };
        disp.reset(delay)?;
        delay.delay_ms(5);
        disp.init_display()?;
        delay.delay_ms(5);
        Ok(disp)
    }

    /// Pulse the reset line. The controller comes back with its power-on defaults, so this is
    /// normally followed by `init_display`.
    pub fn reset<DELAY>(&mut self, delay: &mut DELAY) -> Result<(), Error<DI::Error, RST::Error>>
    where
        DELAY: DelayMs<u8>,
    {
        pulse_reset(&mut self.rst, delay).map_err(Error::Pin)
    }

    /// Send the full register initialization sequence, turn the panel on, and clear it. The
    /// register values come from the `Config` and do not depend on the panel geometry.
    pub fn init_display(&mut self) -> Result<(), Error<DI::Error, RST::Error>> {
        debug!(
            "initializing {}x{} SSD1322 panel",
            self.frame.width(),
            self.frame.height()
        );
        self.config.send(&mut self.iface, false)?;
        Command::SetDisplayMode(DisplayMode::Normal).send(&mut self.iface)?;
        Command::DisablePartialDisplay.send(&mut self.iface)?;
        self.sleep(false)?;
        self.frame.fill(0);
        self.show()
    }

    /// Control sleep mode.
    pub fn sleep(&mut self, enabled: bool) -> Result<(), Error<DI::Error, RST::Error>> {
        Command::SetSleepMode(enabled).send(&mut self.iface)?;
        Ok(())
    }

    /// Disable the internal VDD regulator and put the panel to sleep. Undo with `power_on`.
    pub fn power_off(&mut self) -> Result<(), Error<DI::Error, RST::Error>> {
        Command::SetInternalRegulator(false).send(&mut self.iface)?;
        self.sleep(true)
    }

    /// Enable the internal VDD regulator and wake the panel.
    pub fn power_on(&mut self) -> Result<(), Error<DI::Error, RST::Error>> {
        Command::SetInternalRegulator(true).send(&mut self.iface)?;
        self.sleep(false)
    }

    /// Set the contrast current, 0-255.
    pub fn set_contrast(&mut self, level: u8) -> Result<(), Error<DI::Error, RST::Error>> {
        Command::SetContrastCurrent(level).send(&mut self.iface)?;
        Ok(())
    }

    /// Control the master contrast, 0-15.
    pub fn set_master_contrast(
        &mut self,
        contrast: u8,
    ) -> Result<(), Error<DI::Error, RST::Error>> {
        Command::SetMasterContrast(contrast).send(&mut self.iface)?;
        Ok(())
    }

    /// Turn the image by 180 degrees (`rotate == true`) or back. The panel is powered down while
    /// the remapping register changes.
    pub fn set_rotation<DELAY>(
        &mut self,
        rotate: bool,
        delay: &mut DELAY,
    ) -> Result<(), Error<DI::Error, RST::Error>>
    where
        DELAY: DelayMs<u8>,
    {
        self.power_off()?;
        delay.delay_ms(5);
        self.config
            .persistent_config
            .send(&mut self.iface, rotate)?;
        self.power_on()?;
        delay.delay_ms(5);
        Ok(())
    }

    /// Write display mode `0xA4 | invert << 1 | invert`: inverse (0xA7) when `invert` is set,
    /// otherwise 0xA4. Note 0xA4 is `DisplayMode::BlankDark`; `set_display_mode` selects
    /// `DisplayMode::Normal` (0xA6).
    pub fn set_invert(&mut self, invert: bool) -> Result<(), Error<DI::Error, RST::Error>> {
        let mode = match invert {
            true => DisplayMode::Inverse,
            false => DisplayMode::BlankDark,
        };
        self.set_display_mode(mode)
    }

    /// Set the display operating mode. See `DisplayMode`.
    pub fn set_display_mode(
        &mut self,
        mode: DisplayMode,
    ) -> Result<(), Error<DI::Error, RST::Error>> {
        Command::SetDisplayMode(mode).send(&mut self.iface)?;
        Ok(())
    }

    /// Set the vertical pan.
    ///
    /// This uses the `Command::SetStartLine` feature to shift the display RAM row addresses
    /// relative to the active set of COM lines.
    pub fn vertical_pan(&mut self, offset: u8) -> Result<(), Error<DI::Error, RST::Error>> {
        Command::SetStartLine(offset).send(&mut self.iface)?;
        Ok(())
    }

    /// Restrict the active rows to `start..=end`, or make all rows active again with `None`.
    pub fn partial_display(
        &mut self,
        rows: Option<(u8, u8)>,
    ) -> Result<(), Error<DI::Error, RST::Error>> {
        match rows {
            Some((start, end)) => {
                Command::EnablePartialDisplay(start, end).send(&mut self.iface)?
            }
            None => Command::DisablePartialDisplay.send(&mut self.iface)?,
        }
        Ok(())
    }

    /// Set every pixel of the buffer to `value` (0-15).
    pub fn fill(&mut self, value: u8) {
        self.frame.fill(value)
    }

    /// Set one buffered pixel to `value` (0-15).
    pub fn set_pixel(&mut self, x: i32, y: i32, value: u8) {
        self.frame.set_pixel(x, y, value)
    }

    /// Read back one buffered pixel.
    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        self.frame.pixel(x, y)
    }

    /// Fast path that turns a whole byte of the buffer on or off, at offset `width/2*y + x/2`.
    ///
    /// This ignores gray levels and always sets both pixels sharing the byte; see
    /// `FrameBuffer::set_pixel_pair`.
    pub fn pp(&mut self, x: u16, y: u16, on: bool) {
        self.frame.set_pixel_pair(x, y, on)
    }

    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, value: u8) {
        self.frame.draw_line(x1, y1, x2, y2, value)
    }

    /// Software scroll of the buffer. See `FrameBuffer::scroll`.
    pub fn scroll(&mut self, dx: i32, dy: i32) {
        self.frame.scroll(dx, dy)
    }

    /// Draw `text` at full brightness with its top-left corner at `(x, y)`.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32) {
        self.frame.draw_text(text, x, y, MAX_LEVEL)
    }

    /// Draw `text` at gray level `value` with its top-left corner at `(x, y)`.
    pub fn draw_text_level(&mut self, text: &str, x: i32, y: i32, value: u8) {
        self.frame.draw_text(text, x, y, value)
    }

    /// Transfer the whole buffer to display RAM.
    ///
    /// The panel is centered in the controller's 480 columns, so the column window starts at
    /// `(480 - width) / 2` pixels, in units of 4-pixel column addresses. A geometry the controller
    /// cannot address returns `Error::OutOfRange` before anything is sent.
    pub fn show(&mut self) -> Result<(), Error<DI::Error, RST::Error>> {
        let width = i32::from(self.frame.width());
        let height = i32::from(self.frame.height());
        let offset = (i32::from(NUM_PIXEL_COLS) - width).div_euclid(2);
        let col_start = offset.div_euclid(4);
        let col_end = col_start + width.div_euclid(4) - 1;

        let to_u8 = |v: i32| -> Result<u8, Error<DI::Error, RST::Error>> {
            u8::try_from(v).map_err(|_| Error::OutOfRange)
        };
        let (col_start, col_end, row_end) =
            (to_u8(col_start)?, to_u8(col_end)?, to_u8(height - 1)?);

        trace!(
            "flushing {} bytes to columns {}..={}, rows 0..={}",
            self.frame.as_bytes().len(),
            col_start,
            col_end,
            row_end
        );
        Command::SetColumnAddress(col_start, col_end).send(&mut self.iface)?;
        Command::SetRowAddress(0, row_end).send(&mut self.iface)?;
        BufCommand::WriteImageData(self.frame.as_bytes()).send(&mut self.iface)?;
        Ok(())
    }

    /// Panel width and height in pixels.
    pub fn dimensions(&self) -> (u16, u16) {
        (self.frame.width(), self.frame.height())
    }

    /// The packed pixel buffer.
    pub fn buffer(&self) -> &[u8] {
        self.frame.as_bytes()
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn frame_buffer_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frame
    }

    /// Tear down the driver, giving back the interface and the reset pin.
    pub fn release(self) -> (DI, RST) {
        (self.iface, self.rst)
    }
}

impl<DI, RST> DrawTarget for Display<DI, RST>
where
    DI: interface::DisplayInterface,
    RST: OutputPin,
{
    type Color = Gray4;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.frame.draw_iter(pixels)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.frame.clear(color)
    }
}

impl<DI, RST> OriginDimensions for Display<DI, RST>
where
    DI: interface::DisplayInterface,
    RST: OutputPin,
{
    fn size(&self) -> Size {
        self.frame.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::test_spy::{Sent, TestSpyInterface};
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
    use embedded_hal_mock::pin::{Mock as PinMock, State, Transaction as PinTransaction};
    use std::vec::Vec;

    /// Records every delay requested.
    #[derive(Default)]
    struct SpyDelay(Vec<u8>);

    impl DelayMs<u8> for SpyDelay {
        fn delay_ms(&mut self, ms: u8) {
            self.0.push(ms)
        }
    }

    fn reset_pin() -> PinMock {
        PinMock::new(&[
            PinTransaction::set(State::High),
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ])
    }

    fn build(di: &TestSpyInterface, width: u16, height: u16) -> Display<TestSpyInterface, PinMock> {
        Display::new(di.split(), reset_pin(), &mut SpyDelay::default(), width, height).unwrap()
    }

    #[test]
    fn init_sequence() {
        let di = TestSpyInterface::new();
        let _disp = build(&di, DEFAULT_WIDTH, DEFAULT_HEIGHT);
        #[rustfmt::skip]
        let mut expect = sends!(
            0xFD, [0x12], // unlock
            0xA4, // display off
            0xB3, [0x91], // clock
            0xCA, [0x3F], // mux ratio 64 lines
            0xA2, [0x00], // display offset 0
            0xA1, [0x00], // start line 0
            0xA0, [0x14, 0x11], // remapping
            0xB5, [0x00], // GPIO
            0xAB, [0x01], // regulator on
            0xB4, [0xA0, 0xB5], // display enhancement A
            0xC1, [0x7F], // contrast current
            0xC7, [0x0F], // master contrast
            0xB8, [0x00, 0x02, 0x08, 0x0D, 0x14, 0x1A, 0x20, 0x28,
                   0x30, 0x38, 0x40, 0x48, 0x50, 0x60, 0x70,
                   0x00], // gray scale table, then enable
            0xB1, [0xE2], // phase lengths
            0xD1, [0xA2, 0x20], // display enhancement B
            0xBB, [0x1F], // precharge voltage
            0xB6, [0x08], // second precharge
            0xBE, [0x07], // VCOMH
            0xA6, // display normal
            0xA9, // exit partial display
            0xAF, // sleep disable
            0x15, [28, 91], // column window
            0x75, [0, 63], // row window
            0x5C // write RAM
        )
        .to_vec();
        expect.push(Sent::Data(vec![0; 256 * 64 / 2]));
        di.check_multi(&expect);
    }

    #[test]
    fn reset_pulse() {
        let di = TestSpyInterface::new();
        let mut rst = reset_pin();
        let mut delay = SpyDelay::default();
        let disp = Display::new(di.split(), rst.clone(), &mut delay, 256, 64).unwrap();
        // Reset pulse, wait before init, settle after init.
        assert_eq!(delay.0, vec![1, 10, 5, 5]);
        rst.done();
        let (_, _) = disp.release();
    }

    #[test]
    fn hard_reset_sends_nothing() {
        let mut di = TestSpyInterface::new();
        let pulse = [
            PinTransaction::set(State::High),
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ];
        let mut rst = PinMock::new(pulse.iter().chain(pulse.iter()));
        let mut disp = Display::new(di.split(), rst.clone(), &mut SpyDelay::default(), 256, 64)
            .unwrap();
        di.clear();
        let mut delay = SpyDelay::default();
        disp.reset(&mut delay).unwrap();
        assert_eq!(delay.0, vec![1, 10]);
        assert!(di.sent().is_empty());
        rst.done();
    }

    #[test]
    fn rerun_init_resends_sequence() {
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 256, 64);
        let first = di.sent();
        di.clear();
        disp.set_pixel(3, 3, 15);
        disp.init_display().unwrap();
        assert_eq!(di.sent(), first);
    }

    #[test]
    fn buffer_length_never_changes() {
        let di = TestSpyInterface::new();
        let mut disp = build(&di, 256, 64);
        assert_eq!(disp.buffer().len(), 256 * 64 / 2);
        disp.fill(9);
        disp.set_pixel(10, 10, 1);
        disp.draw_line(0, 0, 255, 63, 4);
        disp.draw_text("SSD1322", 0, 0);
        disp.scroll(3, -2);
        disp.pp(8, 8, true);
        disp.frame_buffer_mut().as_bytes_mut()[0] = 0x12;
        assert_eq!(disp.frame_buffer().pixel(1, 0), Some(2));
        assert_eq!(disp.buffer().len(), 256 * 64 / 2);

        let disp = build(&di, 128, 32);
        assert_eq!(disp.buffer().len(), 128 * 32 / 2);
        assert_eq!(disp.dimensions(), (128, 32));
    }

    #[test]
    fn invert() {
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 256, 64);
        di.clear();
        disp.set_invert(true).unwrap();
        disp.set_invert(false).unwrap();
        di.check_multi(sends!(0xA7, 0xA4));
    }

    #[test]
    fn display_modes() {
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 256, 64);
        di.clear();
        disp.set_display_mode(DisplayMode::BlankBright).unwrap();
        disp.set_display_mode(DisplayMode::Normal).unwrap();
        di.check_multi(sends!(0xA5, 0xA6));
    }

    #[test]
    fn fill_zero_then_show() {
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 256, 64);
        disp.fill(5);
        disp.fill(0);
        di.clear();
        disp.show().unwrap();
        let sent = di.sent();
        assert_eq!(sent.last(), Some(&Sent::Data(vec![0; 8192])));
    }

    #[test]
    fn column_window() {
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 256, 64);
        di.clear();
        disp.show().unwrap();
        assert_eq!(di.sent()[..5], sends!(0x15, [28, 91], 0x75, [0, 63], 0x5C)[..]);

        // A narrower panel is still centered in the 480 columns.
        let mut disp = build(&di, 128, 32);
        di.clear();
        disp.show().unwrap();
        assert_eq!(di.sent()[..5], sends!(0x15, [44, 75], 0x75, [0, 31], 0x5C)[..]);
    }

    #[test]
    fn mux_ratio_ignores_panel_height() {
        let di = TestSpyInterface::new();
        let _disp = build(&di, 256, 32);
        assert_eq!(di.sent()[5..7], sends!(0xCA, [0x3F])[..]);

        // Fewer rows than the smallest MUX ratio still initializes.
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 256, 8);
        assert_eq!(di.sent()[5..7], sends!(0xCA, [0x3F])[..]);
        di.clear();
        disp.show().unwrap();
        assert_eq!(di.sent()[..5], sends!(0x15, [28, 91], 0x75, [0, 7], 0x5C)[..]);
    }

    #[test]
    fn unaddressable_geometry() {
        let di = TestSpyInterface::new();
        let too_wide = Display::new(di.split(), reset_pin(), &mut SpyDelay::default(), 600, 64);
        assert_eq!(too_wide.err(), Some(Error::OutOfRange));
        let too_tall = Display::new(di.split(), reset_pin(), &mut SpyDelay::default(), 256, 300);
        assert_eq!(too_tall.err(), Some(Error::OutOfRange));
    }

    #[test]
    fn power_cycle() {
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 256, 64);
        di.clear();
        disp.power_on().unwrap();
        disp.power_off().unwrap();
        disp.power_on().unwrap();
        #[rustfmt::skip]
        let expect: &[Sent] = sends!(
            0xAB, [0x01], 0xAF,
            0xAB, [0x00], 0xAE,
            0xAB, [0x01], 0xAF
        );
        di.check_multi(expect);
    }

    #[test]
    fn show_is_idempotent() {
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 256, 64);
        disp.draw_text("hi", 4, 4);
        di.clear();
        disp.show().unwrap();
        let first = di.sent();
        di.clear();
        disp.show().unwrap();
        assert_eq!(di.sent(), first);
    }

    #[test]
    fn contrast_uses_argument() {
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 256, 64);
        di.clear();
        disp.set_contrast(0x42).unwrap();
        disp.set_contrast(0xFF).unwrap();
        di.check_multi(sends!(0xC1, [0x42], 0xC1, [0xFF]));
    }

    #[test]
    fn master_contrast() {
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 256, 64);
        di.clear();
        disp.set_master_contrast(4).unwrap();
        di.check(0xC7, &[4]);
        assert_eq!(disp.set_master_contrast(16), Err(Error::OutOfRange));
    }

    #[test]
    fn rotation() {
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 256, 64);
        di.clear();
        let mut delay = SpyDelay::default();
        disp.set_rotation(true, &mut delay).unwrap();
        disp.set_rotation(false, &mut delay).unwrap();
        #[rustfmt::skip]
        let expect: &[Sent] = sends!(
            0xAB, [0x00], 0xAE,
            0xA0, [0x06, 0x11],
            0xAB, [0x01], 0xAF,
            0xAB, [0x00], 0xAE,
            0xA0, [0x14, 0x11],
            0xAB, [0x01], 0xAF
        );
        di.check_multi(expect);
        assert_eq!(delay.0, vec![5, 5, 5, 5]);
    }

    #[test]
    fn pan_and_partial_display() {
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 256, 64);
        di.clear();
        disp.vertical_pan(16).unwrap();
        disp.partial_display(Some((8, 23))).unwrap();
        disp.partial_display(None).unwrap();
        di.check_multi(sends!(0xA1, [16], 0xA8, [8, 23], 0xA9));
        assert_eq!(disp.partial_display(Some((23, 8))), Err(Error::OutOfRange));
    }

    #[test]
    fn pixel_pair_reaches_device() {
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 8, 16);
        disp.pp(2, 1, true);
        di.clear();
        disp.show().unwrap();
        let mut expect = vec![0u8; 8 * 16 / 2];
        expect[5] = 0xFF;
        assert_eq!(di.sent().last(), Some(&Sent::Data(expect)));
    }

    #[test]
    fn embedded_graphics_drawing() {
        let mut di = TestSpyInterface::new();
        let mut disp = build(&di, 8, 16);
        Rectangle::new(Point::new(0, 0), Size::new(4, 1))
            .into_styled(PrimitiveStyle::with_fill(Gray4::new(0xA)))
            .draw(&mut disp)
            .unwrap();
        assert_eq!(disp.pixel(3, 0), Some(0xA));
        di.clear();
        disp.show().unwrap();
        let mut expect = vec![0u8; 8 * 16 / 2];
        expect[0] = 0xAA;
        expect[1] = 0xAA;
        assert_eq!(di.sent().last(), Some(&Sent::Data(expect)));
    }
}
