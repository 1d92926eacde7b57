//! Outbound side of the hello exchange
//!
//! The engine never touches a socket. On every hello tick it hands the
//! encoded payload to whatever the host plugged in here.

/// Link-local broadcast of hello payloads
pub trait HelloTransport {
    /// Queue `payload` for broadcast to every node in radio range
    fn send_broadcast(&mut self, payload: &[u8]);
}

/// Collects payloads in memory (tests, simulation)
impl HelloTransport for Vec<Vec<u8>> {
    fn send_broadcast(&mut self, payload: &[u8]) {
        self.push(payload.to_vec());
    }
}

impl<T: HelloTransport + ?Sized> HelloTransport for &mut T {
    fn send_broadcast(&mut self, payload: &[u8]) {
        (**self).send_broadcast(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broadcast_twice(transport: &mut impl HelloTransport) {
        transport.send_broadcast(&[1, 2]);
        transport.send_broadcast(&[3]);
    }

    #[test]
    fn test_vec_transport_records_payloads() {
        let mut sent: Vec<Vec<u8>> = Vec::new();
        broadcast_twice(&mut sent);
        assert_eq!(sent, vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_dyn_transport() {
        let mut sent: Vec<Vec<u8>> = Vec::new();
        let mut transport: &mut dyn HelloTransport = &mut sent;
        broadcast_twice(&mut transport);
        assert_eq!(sent.len(), 2);
    }
}
