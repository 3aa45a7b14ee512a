//! Well-known ADS index groups

/// PLC: read/write PLC memory (%M fields)
pub const PLC_RW_M: u32 = 0x4020;

/// Get a u32 handle to the symbol named in the write data; offset 0.
/// Used with a ReadWrite transaction.
pub const GET_SYMHANDLE_BYNAME: u32 = 0xF003;
/// Read/write symbol data by handle; the handle is the index offset
pub const RW_SYMVAL_BYHANDLE: u32 = 0xF005;
/// Release a symbol handle written as data; offset 0
pub const RELEASE_SYMHANDLE: u32 = 0xF006;
