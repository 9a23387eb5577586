use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use libc::{c_int, c_void, sockaddr_ll, AF_PACKET, ETH_P_ALL, SOCK_RAW};
use nix::net::if_::if_nametoindex;

use crate::error::{InjectError, Result};

pub fn interface_index(name: &str) -> Result<i32> {
    let idx = if_nametoindex(name).map_err(|e| match InjectError::from(e) {
        InjectError::Socket(_) => InjectError::Interface(format!("{}: {}", name, e)),
        other => other,
    })?;
    Ok(idx as i32)
}

fn last_os_error(context: &str) -> InjectError {
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::EPERM) | Some(libc::EACCES) => {
            InjectError::Permission(format!("{}: {} (run as root)", context, err))
        }
        Some(libc::ENODEV) | Some(libc::ENXIO) => {
            InjectError::Interface(format!("{}: {}", context, err))
        }
        _ => InjectError::Socket(format!("{}: {}", context, err)),
    }
}

/// Raw packet socket bound to `ifindex` for sending radiotap-prefixed frames.
pub fn open_socket_tx(ifindex: i32) -> Result<OwnedFd> {
    let protocol = (ETH_P_ALL as u16).to_be();

    let fd = unsafe { libc::socket(AF_PACKET, SOCK_RAW, protocol as c_int) };
    if fd < 0 {
        return Err(last_os_error("Failed to create raw socket"));
    }
    // Closed on drop from here on.
    let socket = unsafe { OwnedFd::from_raw_fd(fd) };

    let mut addr: sockaddr_ll = unsafe { mem::zeroed() };
    addr.sll_family = AF_PACKET as u16;
    addr.sll_ifindex = ifindex;
    addr.sll_protocol = protocol;

    let rc = unsafe {
        libc::bind(
            socket.as_raw_fd(),
            &addr as *const sockaddr_ll as *const libc::sockaddr,
            mem::size_of::<sockaddr_ll>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(last_os_error("Failed to bind socket to interface"));
    }

    Ok(socket)
}

pub fn write_packet(fd: RawFd, packet: &[u8]) -> Result<usize> {
    let bytes_written = unsafe { libc::write(fd, packet.as_ptr() as *const c_void, packet.len()) };

    if bytes_written < 0 {
        return Err(InjectError::Injection(
            io::Error::last_os_error().to_string(),
        ));
    }

    Ok(bytes_written as usize)
}
