//! Defines structs for storing register values of commands in the SSD1322 that are associated with
//! relatively-static configuration.
//!
//! `Config::default()` holds the register values for the common 256x64 dual-COM modules. Builder
//! methods replace individual values; the order in which the registers are written never changes.

use crate::command::*;
use crate::interface;

/// Gamma table programmed during initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrayScaleTable {
    /// The chip's built-in linear table.
    Default,
    /// A custom table of pulse widths for levels 1-15. See `BufCommand::SetGrayScaleTable`.
    Custom([u8; 15]),
}

/// Pulse widths (in DCLKs) for gray levels 1-15 used by `Config::default()`.
pub const DEFAULT_GRAY_SCALE_TABLE: [u8; 15] = [
    0x00, 0x02, 0x08, 0x0D, 0x14, 0x1A, 0x20, 0x28, 0x30, 0x38, 0x40, 0x48, 0x50, 0x60, 0x70,
];

/// The portion of the configuration which shares registers with functions that can be changed
/// after initialization (rotation rewrites the remapping register).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PersistentConfig {
    com_scan_direction: ComScanDirection,
    com_layout: ComLayout,
}

impl PersistentConfig {
    /// Transmit the remapping command for the layout in `self`. A rotated panel has its columns
    /// reversed and its COM scan direction flipped, turning the image by 180 degrees.
    pub(crate) fn send<DI>(
        &self,
        iface: &mut DI,
        rotated: bool,
    ) -> Result<(), CommandError<DI::Error>>
    where
        DI: interface::DisplayInterface,
    {
        let (column_remap, com_scan_direction) = if rotated {
            let flipped = match self.com_scan_direction {
                ComScanDirection::RowZeroFirst => ComScanDirection::RowZeroLast,
                ComScanDirection::RowZeroLast => ComScanDirection::RowZeroFirst,
            };
            (ColumnRemap::Reverse, flipped)
        } else {
            (ColumnRemap::Forward, self.com_scan_direction)
        };
        Command::SetRemapping(
            IncrementAxis::Horizontal,
            column_remap,
            NibbleRemap::Forward,
            com_scan_direction,
            self.com_layout,
        )
        .send(iface)
    }
}

/// A configuration for the display. Every register is written at init time; builder methods offer
/// a declarative way to replace the value written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub(crate) persistent_config: PersistentConfig,
    clock_fosc_divset_cmd: Command,
    mux_ratio_cmd: Command,
    gpio_cmd: Command,
    display_enhancements_cmd: Command,
    contrast_current_cmd: Command,
    master_contrast_cmd: Command,
    gray_scale_table: GrayScaleTable,
    phase_lengths_cmd: Command,
    precharge_voltage_cmd: Command,
    second_precharge_period_cmd: Command,
    com_deselect_voltage_cmd: Command,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            persistent_config: PersistentConfig {
                com_scan_direction: ComScanDirection::RowZeroLast,
                com_layout: ComLayout::DualProgressive,
            },
            clock_fosc_divset_cmd: Command::SetClockFoscDivset(9, 1),
            mux_ratio_cmd: Command::SetMuxRatio(64),
            gpio_cmd: Command::SetGpio(GpioMode::HiZInputDisabled, GpioMode::HiZInputDisabled),
            display_enhancements_cmd: Command::SetDisplayEnhancements(true, false),
            contrast_current_cmd: Command::SetContrastCurrent(0x7F),
            master_contrast_cmd: Command::SetMasterContrast(0x0F),
            gray_scale_table: GrayScaleTable::Custom(DEFAULT_GRAY_SCALE_TABLE),
            phase_lengths_cmd: Command::SetPhaseLengths(5, 14),
            precharge_voltage_cmd: Command::SetPreChargeVoltage(0x1F),
            second_precharge_period_cmd: Command::SetSecondPrechargePeriod(8),
            com_deselect_voltage_cmd: Command::SetComDeselectVoltage(7),
        }
    }
}

impl Config {
    /// Create the default configuration. See `Default`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend this `Config` to use a different COM scan direction and COM layout. The layout is
    /// dictated by the display module; see `ComLayout`.
    pub fn com_layout(self, com_scan_direction: ComScanDirection, com_layout: ComLayout) -> Self {
        Self {
            persistent_config: PersistentConfig {
                com_scan_direction,
                com_layout,
            },
            ..self
        }
    }

    /// Extend this `Config` to explicitly configure display contrast current. See
    /// `Command::SetContrastCurrent`.
    pub fn contrast_current(self, current: u8) -> Self {
        Self {
            contrast_current_cmd: Command::SetContrastCurrent(current),
            ..self
        }
    }

    /// Extend this `Config` to explicitly configure the master contrast. See
    /// `Command::SetMasterContrast`.
    pub fn master_contrast(self, contrast: u8) -> Self {
        Self {
            master_contrast_cmd: Command::SetMasterContrast(contrast),
            ..self
        }
    }

    /// Extend this `Config` to explicitly configure OLED drive phase lengths. See
    /// `Command::SetPhaseLengths`.
    pub fn phase_lengths(self, reset: u8, first_precharge: u8) -> Self {
        Self {
            phase_lengths_cmd: Command::SetPhaseLengths(reset, first_precharge),
            ..self
        }
    }

    /// Extend this `Config` to explicitly configure the display clock frequency and divider. See
    /// `Command::SetClockFoscDivset`.
    pub fn clock_fosc_divset(self, fosc: u8, divset: u8) -> Self {
        Self {
            clock_fosc_divset_cmd: Command::SetClockFoscDivset(fosc, divset),
            ..self
        }
    }

    /// Extend this `Config` to drive a different number of COM lines. The panel height does not
    /// change this register. See `Command::SetMuxRatio`.
    pub fn mux_ratio(self, ratio: u8) -> Self {
        Self {
            mux_ratio_cmd: Command::SetMuxRatio(ratio),
            ..self
        }
    }

    /// Extend this `Config` to explicitly configure display enhancement features. See
    /// `Command::SetDisplayEnhancements`.
    pub fn display_enhancements(self, external_vsl: bool, enhanced_low_gs_quality: bool) -> Self {
        Self {
            display_enhancements_cmd: Command::SetDisplayEnhancements(
                external_vsl,
                enhanced_low_gs_quality,
            ),
            ..self
        }
    }

    /// Extend this `Config` to explicitly configure the GPIO pins. See `Command::SetGpio`.
    pub fn gpio(self, gpio0: GpioMode, gpio1: GpioMode) -> Self {
        Self {
            gpio_cmd: Command::SetGpio(gpio0, gpio1),
            ..self
        }
    }

    /// Extend this `Config` to program a different gamma table.
    pub fn gray_scale_table(self, table: GrayScaleTable) -> Self {
        Self {
            gray_scale_table: table,
            ..self
        }
    }

    /// Extend this `Config` to explicitly configure OLED drive second precharge period length. See
    /// `Command::SetSecondPrechargePeriod`.
    pub fn second_precharge_period(self, period: u8) -> Self {
        Self {
            second_precharge_period_cmd: Command::SetSecondPrechargePeriod(period),
            ..self
        }
    }

    /// Extend this `Config` to explicitly configure OLED drive precharge voltage. See
    /// `Command::SetPreChargeVoltage`.
    pub fn precharge_voltage(self, voltage: u8) -> Self {
        Self {
            precharge_voltage_cmd: Command::SetPreChargeVoltage(voltage),
            ..self
        }
    }

    /// Extend this `Config` to explicitly configure OLED drive COM deselect voltage. See
    /// `Command::SetComDeselectVoltage`.
    pub fn com_deselect_voltage(self, voltage: u8) -> Self {
        Self {
            com_deselect_voltage_cmd: Command::SetComDeselectVoltage(voltage),
            ..self
        }
    }

    /// Transmit the register writes of the init sequence, from unlocking the command set through
    /// the COM deselect voltage. The panel is left blanked; the caller turns it on.
    pub(crate) fn send<DI>(
        &self,
        iface: &mut DI,
        rotated: bool,
    ) -> Result<(), CommandError<DI::Error>>
    where
        DI: interface::DisplayInterface,
    {
        Command::SetCommandLock(false).send(iface)?;
        Command::SetDisplayMode(DisplayMode::BlankDark).send(iface)?;
        self.clock_fosc_divset_cmd.send(iface)?;
        self.mux_ratio_cmd.send(iface)?;
        Command::SetDisplayOffset(0).send(iface)?;
        Command::SetStartLine(0).send(iface)?;
        self.persistent_config.send(iface, rotated)?;
        self.gpio_cmd.send(iface)?;
        Command::SetInternalRegulator(true).send(iface)?;
        self.display_enhancements_cmd.send(iface)?;
        self.contrast_current_cmd.send(iface)?;
        self.master_contrast_cmd.send(iface)?;
        match self.gray_scale_table {
            GrayScaleTable::Custom(ref table) => {
                BufCommand::SetGrayScaleTable(table).send(iface)?
            }
            GrayScaleTable::Default => Command::SetDefaultGrayScaleTable.send(iface)?,
        }
        self.phase_lengths_cmd.send(iface)?;
        Command::SetDisplayEnhancementB.send(iface)?;
        self.precharge_voltage_cmd.send(iface)?;
        self.second_precharge_period_cmd.send(iface)?;
        self.com_deselect_voltage_cmd.send(iface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::test_spy::{Sent, TestSpyInterface};

    #[test]
    fn default_register_values() {
        let mut di = TestSpyInterface::new();
        Config::default().send(&mut di, false).unwrap();
        #[rustfmt::skip]
        let expect: &[Sent] = sends!(
            0xFD, [0x12],
            0xA4,
            0xB3, [0x91],
            0xCA, [0x3F],
            0xA2, [0x00],
            0xA1, [0x00],
            0xA0, [0x14, 0x11],
            0xB5, [0x00],
            0xAB, [0x01],
            0xB4, [0xA0, 0xB5],
            0xC1, [0x7F],
            0xC7, [0x0F],
            0xB8, [0x00, 0x02, 0x08, 0x0D, 0x14, 0x1A, 0x20, 0x28,
                   0x30, 0x38, 0x40, 0x48, 0x50, 0x60, 0x70, 0x00],
            0xB1, [0xE2],
            0xD1, [0xA2, 0x20],
            0xBB, [0x1F],
            0xB6, [0x08],
            0xBE, [0x07]
        );
        di.check_multi(expect);
    }

    #[test]
    fn many_options() {
        let mut di = TestSpyInterface::new();
        let cfg = Config::new()
            .com_layout(ComScanDirection::RowZeroFirst, ComLayout::Progressive)
            .contrast_current(160)
            .master_contrast(8)
            .phase_lengths(5, 3)
            .clock_fosc_divset(7, 0)
            .mux_ratio(128)
            .display_enhancements(false, true)
            .gpio(GpioMode::OutputLow, GpioMode::HiZInputDisabled)
            .gray_scale_table(GrayScaleTable::Default)
            .second_precharge_period(4)
            .precharge_voltage(5)
            .com_deselect_voltage(6);
        cfg.send(&mut di, false).unwrap();
        #[rustfmt::skip]
        let expect: &[Sent] = sends!(
            0xFD, [0x12],
            0xA4,
            0xB3, [0x70],
            0xCA, [0x7F],
            0xA2, [0x00],
            0xA1, [0x00],
            0xA0, [0x04, 0x01],
            0xB5, [0x02],
            0xAB, [0x01],
            0xB4, [0xA2, 0xFD],
            0xC1, [160],
            0xC7, [8],
            0xB9,
            0xB1, [0x32],
            0xD1, [0xA2, 0x20],
            0xBB, [5],
            0xB6, [4],
            0xBE, [6]
        );
        di.check_multi(expect);
    }

    #[test]
    fn rotated_remapping() {
        let mut di = TestSpyInterface::new();
        Config::default()
            .persistent_config
            .send(&mut di, true)
            .unwrap();
        di.check(0xA0, &[0x06, 0x11]);
    }

    #[test]
    fn invalid_option_stops_sequence() {
        let mut di = TestSpyInterface::new();
        let cfg = Config::new().master_contrast(16);
        assert_eq!(
            cfg.send(&mut di, false),
            Err(CommandError::OutOfRange)
        );
        // Nothing after the rejected register was sent.
        assert_eq!(di.sent().last(), Some(&Sent::Data(vec![0x7F])));
    }

    #[test]
    fn mux_ratio_out_of_range() {
        let mut di = TestSpyInterface::new();
        let cfg = Config::new().mux_ratio(8);
        assert_eq!(cfg.send(&mut di, false), Err(CommandError::OutOfRange));
        assert_eq!(di.sent().last(), Some(&Sent::Data(vec![0x91])));
    }
}
