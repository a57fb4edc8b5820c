//! Opening destinations
//!
//! Turns a [`DestSpec`] into an open sink. Descriptor-backed destinations
//! (fd, file, fifo) are wrapped in a [`BestEffortWriter`]; processes get a
//! plain blocking [`ProcessSink`].

use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};

use contracts::{ByteSink, ContractError, DestSpec, DestType};
use fanout::{BestEffortWriter, ProcessSink};
use tracing::{debug, instrument};

/// Open a destination, naming the sink after its specifier
///
/// # Errors
/// [`ContractError::DestOpen`] carrying the OS error.
#[instrument(name = "dest_open", skip(spec), fields(dest = %spec))]
pub fn open(spec: &DestSpec) -> Result<Box<dyn ByteSink>, ContractError> {
    let name = spec.to_string();
    open_sink(spec, &name).map_err(|e| ContractError::dest_open(&name, e))
}

/// Open every destination in order
///
/// Stops at the first failure; sinks opened so far are dropped.
pub fn open_all(specs: &[DestSpec]) -> Result<Vec<Box<dyn ByteSink>>, ContractError> {
    specs.iter().map(open).collect()
}

fn open_sink(spec: &DestSpec, name: &str) -> io::Result<Box<dyn ByteSink>> {
    let sink: Box<dyn ByteSink> = match spec.dest_type {
        DestType::Fd => Box::new(BestEffortWriter::new(name, open_fd(spec)?)),
        DestType::File => Box::new(BestEffortWriter::new(name, open_file(spec)?)),
        DestType::Fifo => Box::new(BestEffortWriter::new(name, open_fifo(spec)?)),
        DestType::Proc => Box::new(ProcessSink::spawn(name, &spec.id, &spec.args)?),
    };
    debug!(sink = %name, "Destination opened");
    Ok(sink)
}

/// Duplicate an inherited descriptor so the sink can own and close its copy
fn open_fd(spec: &DestSpec) -> io::Result<File> {
    let fd: RawFd = spec.id.parse().map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "file descriptor has invalid id: have={} want=<number>",
                spec.id
            ),
        )
    })?;

    let file = dup_fd(fd)?;
    configure_fd(&file, spec)?;
    Ok(file)
}

fn open_file(spec: &DestSpec) -> io::Result<File> {
    let file = OpenOptions::new()
        .write(true)
        .create(spec.create)
        .append(spec.append)
        .truncate(!spec.append)
        .mode(spec.perm)
        .open(&spec.id)?;

    configure_fd(&file, spec)?;
    Ok(file)
}

/// Opened read-write so the open never waits for a reader and the pipe
/// survives readers coming and going.
fn open_fifo(spec: &DestSpec) -> io::Result<File> {
    if spec.create {
        make_fifo(&spec.id, spec.perm)?;
    }

    let file = OpenOptions::new().read(true).write(true).open(&spec.id)?;
    configure_fd(&file, spec)?;
    Ok(file)
}

/// Apply the descriptor options of `spec`
fn configure_fd(file: &File, spec: &DestSpec) -> io::Result<()> {
    if spec.nonblocking {
        set_nonblocking(file)?;
    }
    if spec.bufsize != 0 {
        set_pipe_size(file, spec.bufsize)?;
    }
    Ok(())
}

fn dup_fd(fd: RawFd) -> io::Result<File> {
    // SAFETY: F_DUPFD_CLOEXEC only reads `fd`; an invalid descriptor is
    // reported as EBADF.
    let new_fd = unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, 0) };
    if new_fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `new_fd` was just created and is owned by nothing else.
    Ok(unsafe { File::from_raw_fd(new_fd) })
}

fn make_fifo(path: &str, perm: u32) -> io::Result<()> {
    let c_path =
        CString::new(path).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // SAFETY: `c_path` is a valid NUL-terminated string for the whole call.
    if unsafe { libc::mkfifo(c_path.as_ptr(), perm as libc::mode_t) } < 0 {
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::AlreadyExists {
            return Err(err);
        }
    }
    Ok(())
}

fn set_nonblocking(file: &File) -> io::Result<()> {
    let fd = file.as_raw_fd();

    // SAFETY: `fd` stays open for as long as `file` is borrowed.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Set the pipe capacity. On non-pipe descriptors the kernel reports the
/// error, which is propagated as is.
#[cfg(target_os = "linux")]
fn set_pipe_size(file: &File, size: usize) -> io::Result<()> {
    let size = libc::c_int::try_from(size)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "bufsize too large"))?;

    // SAFETY: `fd` stays open for as long as `file` is borrowed.
    if unsafe { libc::fcntl(file.as_raw_fd(), libc::F_SETPIPE_SZ, size) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn set_pipe_size(_file: &File, _size: usize) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "bufsize is only supported on Linux",
    ))
}
