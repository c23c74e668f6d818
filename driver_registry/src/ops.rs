//! The driver capability-set contract.

use core_types::{PowerState, Status};

/// A control request passed to a driver's `ioctl` capability.
///
/// `SetPower` and `Sync` are the standard requests every subsystem shares;
/// subsystem-specific requests use [`IoRequest::Custom`] with ids above
/// [`IoRequest::STANDARD_LAST`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoRequest {
    /// Move the hardware to the given power level
    SetPower(PowerState),
    /// Flush pending I/O
    Sync,
    /// Subsystem-specific request
    Custom { id: u32, arg: u32 },
}

impl IoRequest {
    /// Last standard request id; custom ids are allocated above this.
    pub const STANDARD_LAST: u32 = 0x0F;
}

/// The capability set a concrete driver supplies at registration.
///
/// `init`, `deinit`, `open`, and `close` are required: a driver that cannot
/// provide them does not typecheck, which is this layer's rendering of
/// "missing required capability is a programming error, not a status".
/// `read`, `write`, and `ioctl` are optional; the default bodies report
/// [`Status::UnsupportedOperation`], which lifecycle code and power sweeps
/// treat as "capability absent", never as a hardware fault.
pub trait DriverOps: Send {
    /// One-time hardware setup
    fn init(&mut self) -> Result<(), Status>;

    /// Release everything `init` acquired
    fn deinit(&mut self) -> Result<(), Status>;

    /// Prepare the driver for I/O
    fn open(&mut self) -> Result<(), Status>;

    /// End I/O; inverse of `open`
    fn close(&mut self) -> Result<(), Status>;

    /// Read into `buf`, returning bytes produced
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Status> {
        Err(Status::UnsupportedOperation)
    }

    /// Write from `buf`, returning bytes consumed
    fn write(&mut self, _buf: &[u8]) -> Result<usize, Status> {
        Err(Status::UnsupportedOperation)
    }

    /// Handle a control request
    fn ioctl(&mut self, _request: IoRequest) -> Result<(), Status> {
        Err(Status::UnsupportedOperation)
    }
}
