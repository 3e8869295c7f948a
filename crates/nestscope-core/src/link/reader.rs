use super::error::LinkError;
use super::layout;

pub struct UdpReader<'a> {
    datagram: &'a [u8],
}

impl<'a> UdpReader<'a> {
    pub fn new(datagram: &'a [u8]) -> Self {
        Self { datagram }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), LinkError> {
        if self.datagram.len() < needed {
            return Err(LinkError::ShortDatagram {
                needed,
                actual: self.datagram.len(),
            });
        }
        Ok(())
    }

    pub fn payload_without_header(&self) -> Result<&'a [u8], LinkError> {
        self.require_len(layout::UDP_HEADER_LEN)?;
        self.datagram
            .get(layout::UDP_HEADER_LEN..)
            .ok_or(LinkError::ShortDatagram {
                needed: layout::UDP_HEADER_LEN,
                actual: self.datagram.len(),
            })
    }

    /// Payload length promised by the UDP length field.
    pub fn claimed_payload_len(&self) -> Result<usize, LinkError> {
        self.require_len(layout::UDP_HEADER_LEN)?;
        let length = u16::from_be_bytes([self.datagram[4], self.datagram[5]]);
        Ok(usize::from(length).saturating_sub(layout::UDP_HEADER_LEN))
    }
}

#[cfg(test)]
mod tests {
    use super::UdpReader;
    use crate::link::error::LinkError;

    #[test]
    fn payload_without_header_ok() {
        let datagram = [0u8; 12];
        let reader = UdpReader::new(&datagram);
        let payload = reader.payload_without_header().unwrap();
        assert_eq!(payload.len(), 4);
    }

    #[test]
    fn payload_without_header_too_short() {
        let datagram = [0u8; 7];
        let reader = UdpReader::new(&datagram);
        let err = reader.payload_without_header().unwrap_err();
        assert!(matches!(err, LinkError::ShortDatagram { .. }));
    }

    #[test]
    fn claimed_length_excludes_header() {
        let datagram = [0x07, 0x14, 0xc3, 0x50, 0x00, 0x1c, 0x00, 0x00];
        let reader = UdpReader::new(&datagram);
        assert_eq!(reader.claimed_payload_len().unwrap(), 20);
    }
}
