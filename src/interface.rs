//! The transport between the driver and the SSD1322. Commands and data are both sent as byte
//! slices; a single opcode is simply a one-element slice.

pub trait DisplayInterface {
    /// Error reported by the underlying bus or control pins.
    type Error;

    /// Send bytes in the command phase.
    fn send_command(&mut self, cmd: &[u8]) -> Result<(), Self::Error>;

    /// Send bytes in the data phase.
    fn send_data(&mut self, buf: &[u8]) -> Result<(), Self::Error>;
}

pub mod spi {
    //! The SPI interface supports the "4-wire" interface of the driver, such that each word on the
    //! SPI bus is 8 bits. The "3-wire" mode replaces the D/C GPIO with a 9th bit on each word,
    //! which seems really awkward to implement with embedded_hal SPI.

    use embedded_hal as hal;
    use hal::digital::v2::OutputPin;

    use super::DisplayInterface;

    /// Failure of an `SpiInterface` transfer.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum SpiInterfaceError<SpiE, PinE> {
        /// The SPI write failed.
        Spi(SpiE),
        /// The D/C or C/S pin could not be driven.
        Pin(PinE),
    }

    pub struct SpiInterface<SPI, DC, CS> {
        /// The SPI master device connected to the SSD1322.
        spi: SPI,
        /// A GPIO output pin connected to the D/C (data/command) pin of the SSD1322 (the fourth
        /// "wire" of "4-wire" mode).
        dc: DC,
        /// A GPIO output pin connected to the active-low C/S (chip select) pin of the SSD1322.
        cs: CS,
    }

    impl<SPI, DC, CS, PinE> SpiInterface<SPI, DC, CS>
    where
        SPI: hal::blocking::spi::Write<u8>,
        DC: OutputPin<Error = PinE>,
        CS: OutputPin<Error = PinE>,
    {
        /// Create a new SPI interface to communicate with the display driver. `spi` is the SPI
        /// master device, `dc` is the GPIO output pin connected to the D/C pin of the SSD1322, and
        /// `cs` the one connected to its C/S pin.
        pub fn new(spi: SPI, dc: DC, cs: CS) -> Self {
            Self { spi, dc, cs }
        }

        /// Give back the bus and pins.
        pub fn release(self) -> (SPI, DC, CS) {
            (self.spi, self.dc, self.cs)
        }

        /// Select the chip, write `buf`, and deselect the chip again. The chip is deselected even
        /// if the SPI write fails, in which case the SPI error is the one reported.
        fn transfer(&mut self, buf: &[u8]) -> Result<(), SpiInterfaceError<SPI::Error, PinE>> {
            self.cs.set_low().map_err(SpiInterfaceError::Pin)?;
            let written = self.spi.write(buf).map_err(SpiInterfaceError::Spi);
            self.cs.set_high().map_err(SpiInterfaceError::Pin)?;
            written
        }
    }

    impl<SPI, DC, CS, PinE> DisplayInterface for SpiInterface<SPI, DC, CS>
    where
        SPI: hal::blocking::spi::Write<u8>,
        DC: OutputPin<Error = PinE>,
        CS: OutputPin<Error = PinE>,
    {
        type Error = SpiInterfaceError<SPI::Error, PinE>;

        fn send_command(&mut self, cmd: &[u8]) -> Result<(), Self::Error> {
            self.dc.set_low().map_err(SpiInterfaceError::Pin)?;
            self.transfer(cmd)
        }

        fn send_data(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
            self.dc.set_high().map_err(SpiInterfaceError::Pin)?;
            self.transfer(buf)
        }
    }

}
