use std::os::fd::{AsRawFd, OwnedFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::error::{InjectError, Result};
use crate::rawsocks::{interface_index, open_socket_tx, write_packet};
use crate::tx::TestFrame;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InjectionStats {
    pub attempted: u64,
    pub sent: u64,
    pub bytes: u64,
}

/// Sends test frames out of one interface.
pub struct Injector {
    socket: OwnedFd,
}

impl Injector {
    pub fn open(interface: &str) -> Result<Self> {
        let ifindex = interface_index(interface)?;
        let socket = open_socket_tx(ifindex)?;
        debug!("Injection socket open on {} (index {})", interface, ifindex);
        Ok(Self::from_fd(socket))
    }

    pub fn from_fd(socket: OwnedFd) -> Self {
        Injector { socket }
    }

    pub fn send(&self, frame: &TestFrame) -> Result<usize> {
        let written = write_packet(self.socket.as_raw_fd(), &frame.bytes).map_err(|e| {
            InjectError::Injection(format!(
                "{} / {} (type {} subtype {}): {}",
                frame.modulation, frame.name, frame.frame_type, frame.subtype, e
            ))
        })?;
        if written < frame.bytes.len() {
            warn!(
                "Short write for {} / {}: {} of {} bytes",
                frame.modulation,
                frame.name,
                written,
                frame.bytes.len()
            );
        }
        Ok(written)
    }

    /// Send every frame once per round, pausing `interval` after each one.
    ///
    /// Returns early (with the stats so far) once `running` is cleared. The
    /// first failed write ends the run.
    pub fn send_all(
        &self,
        frames: &[TestFrame],
        interval: Duration,
        rounds: u32,
        running: &AtomicBool,
    ) -> Result<InjectionStats> {
        let mut stats = InjectionStats::default();

        'rounds: for round in 1..=rounds {
            if rounds > 1 {
                info!("Round {}/{}", round, rounds);
            }
            for frame in frames {
                if !running.load(Ordering::SeqCst) {
                    info!("Interrupted, stopping injection");
                    break 'rounds;
                }

                stats.attempted += 1;
                debug!(
                    "{} {} seq#{}: {}",
                    frame.modulation,
                    frame.name,
                    stats.attempted,
                    hex::encode(&frame.bytes)
                );
                let written = self.send(frame)?;
                stats.sent += 1;
                stats.bytes += written as u64;

                if !interval.is_zero() {
                    thread::sleep(interval);
                }
            }
        }

        Ok(stats)
    }
}
