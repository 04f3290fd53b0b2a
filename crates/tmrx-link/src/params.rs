//! SyncLink driver ABI: parameter block, statistics block and ioctl numbers.
//!
//! Layouts mirror `linux/synclink.h`; field order and C types must not change.

use libc::{c_uchar, c_ulong, c_ushort};

/// `N_HDLC` line discipline number.
pub const N_HDLC: libc::c_int = 13;

pub const MGSL_MODE_HDLC: c_ulong = 2;
pub const MGSL_MODE_BASE_CLOCK: c_ulong = 7;

pub const HDLC_FLAG_RXC_RXCPIN: c_ushort = 0x0000;
pub const HDLC_FLAG_TXC_TXCPIN: c_ushort = 0x0000;

pub const HDLC_ENCODING_NRZ: c_uchar = 0;
pub const HDLC_CRC_16_CCITT: c_ushort = 1;

pub const HDLC_PREAMBLE_LENGTH_16BITS: c_uchar = 1;
pub const HDLC_PREAMBLE_PATTERN_ONES: c_uchar = 5;

/// `MGSL_IOCRXENABLE` argument: enable and force hunt mode.
pub const RX_ENABLE_HUNT: c_ulong = 2;

/// `MGSL_PARAMS`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct MgslParams {
    pub mode: c_ulong,
    pub loopback: c_uchar,
    pub flags: c_ushort,
    pub encoding: c_uchar,
    pub clock_speed: c_ulong,
    pub addr_filter: c_uchar,
    pub crc_type: c_ushort,
    pub preamble_length: c_uchar,
    pub preamble: c_uchar,
    pub data_rate: c_ulong,
    pub data_bits: c_uchar,
    pub stop_bits: c_uchar,
    pub parity: c_uchar,
}

impl MgslParams {
    /// Parameter block that only programs the adapter's base clock.
    ///
    /// The driver ignores every field but `mode` and `clock_speed`.
    pub fn base_clock(freq: u32) -> Self {
        Self {
            mode: MGSL_MODE_BASE_CLOCK,
            clock_speed: c_ulong::from(freq),
            ..Self::default()
        }
    }

    /// Rewrite fields for externally clocked HDLC reception: NRZ, clocks
    /// from the RxC/TxC pins, hardware CRC-16-CCITT, 16-bit ones preamble.
    pub fn apply_hdlc_receive(&mut self) {
        self.mode = MGSL_MODE_HDLC;
        self.loopback = 0;
        self.flags = HDLC_FLAG_RXC_RXCPIN | HDLC_FLAG_TXC_TXCPIN;
        self.encoding = HDLC_ENCODING_NRZ;
        self.clock_speed = 0;
        self.crc_type = HDLC_CRC_16_CCITT;
        self.preamble = HDLC_PREAMBLE_PATTERN_ONES;
        self.preamble_length = HDLC_PREAMBLE_LENGTH_16BITS;
    }
}

/// `struct mgsl_icount`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct MgslIcount {
    pub cts: u32,
    pub dsr: u32,
    pub rng: u32,
    pub dcd: u32,
    pub tx: u32,
    pub rx: u32,
    pub frame: u32,
    pub parity: u32,
    pub overrun: u32,
    pub brk: u32,
    pub buf_overrun: u32,
    pub txok: u32,
    pub txunder: u32,
    pub txabort: u32,
    pub txtimeout: u32,
    pub rxshort: u32,
    pub rxlong: u32,
    pub rxabort: u32,
    pub rxover: u32,
    pub rxcrc: u32,
    pub rxok: u32,
    pub exithunt: u32,
    pub rxidle: u32,
}

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;

const IOC_NONE: u32 = 0;
const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

const MGSL_MAGIC_IOC: u32 = b'm' as u32;

const fn ioc(dir: u32, nr: u32, size: usize) -> c_ulong {
    ((dir << IOC_DIRSHIFT)
        | (MGSL_MAGIC_IOC << IOC_TYPESHIFT)
        | (nr << IOC_NRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)) as c_ulong
}

pub const MGSL_IOCSPARAMS: c_ulong = ioc(IOC_WRITE, 0, std::mem::size_of::<MgslParams>());
pub const MGSL_IOCGPARAMS: c_ulong = ioc(IOC_READ, 1, std::mem::size_of::<MgslParams>());
pub const MGSL_IOCRXENABLE: c_ulong = ioc(IOC_NONE, 5, 0);
pub const MGSL_IOCGSTATS: c_ulong = ioc(IOC_NONE, 7, 0);
