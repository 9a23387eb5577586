use std::fmt;
use std::str::FromStr;

use crate::error::InjectError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub const fn broadcast() -> Self {
        MacAddress([0xff; 6])
    }

    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xff; 6]
    }
}

impl Default for MacAddress {
    /// Fixed address stamped on every test frame so captures are easy to filter.
    fn default() -> Self {
        MacAddress([0x01, 0x23, 0x45, 0x67, 0x89, 0xab])
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = InjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(InjectError::InvalidMac(s.to_string()));
        }

        let mut addr = [0u8; 6];
        for (byte, part) in addr.iter_mut().zip(parts) {
            if part.len() != 2 {
                return Err(InjectError::InvalidMac(s.to_string()));
            }
            *byte = u8::from_str_radix(part, 16)
                .map_err(|_| InjectError::InvalidMac(s.to_string()))?;
        }
        Ok(MacAddress(addr))
    }
}
