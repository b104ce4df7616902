//! In-memory serial link for running two engines against each other.

use bytes::{Bytes, BytesMut};

use crate::ash::{AshConfig, BufferedPort, Engine, Error, Role, FLAG_BYTE};

/// Deterministic xorshift generator driving fault injection.
pub struct XorShift(u32);

impl XorShift {
    pub fn new(seed: u32) -> XorShift {
        XorShift(seed.max(1))
    }

    pub fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    pub fn chance(&mut self, percent: u32) -> bool {
        self.next() % 100 < percent
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Faults {
    pub drop_percent: u32,
    pub corrupt_percent: u32,
}

/// One direction of the link. Bytes are carried frame by frame so a fault
/// always hits a whole frame.
pub struct Wire {
    rng: XorShift,
    faults: Faults,
    pending: BytesMut,
    pub dropped: usize,
    pub corrupted: usize,
}

impl Wire {
    pub fn new(seed: u32) -> Wire {
        Wire {
            rng: XorShift::new(seed),
            faults: Faults::default(),
            pending: BytesMut::new(),
            dropped: 0,
            corrupted: 0,
        }
    }

    pub fn set_faults(&mut self, faults: Faults) {
        self.faults = faults;
    }

    pub fn transfer(&mut self, from: &mut BufferedPort, to: &mut BufferedPort) {
        self.pending.extend_from_slice(&from.tx_mut().split());
        while let Some(end) = self.pending.iter().position(|&b| b == FLAG_BYTE) {
            let mut chunk = self.pending.split_to(end + 1);
            if self.rng.chance(self.faults.drop_percent) {
                self.dropped += 1;
                continue;
            }
            if chunk.len() > 2 && self.rng.chance(self.faults.corrupt_percent) {
                let idx = chunk.len() / 2;
                chunk[idx] ^= 0x04;
                self.corrupted += 1;
            }
            to.rx_mut().extend_from_slice(&chunk);
        }
    }
}

/// A host engine and an NCP engine joined by two wires.
pub struct Link {
    pub host: Engine,
    pub ncp: Engine,
    pub host_port: BufferedPort,
    pub ncp_port: BufferedPort,
    pub to_ncp: Wire,
    pub to_host: Wire,
    pub host_received: Vec<Bytes>,
    pub ncp_received: Vec<Bytes>,
    pub errors: Vec<Error>,
}

impl Link {
    pub fn new(config: AshConfig, seed: u32) -> Link {
        Link {
            host: Engine::new(config.clone(), Role::Host).expect("valid config"),
            ncp: Engine::new(config, Role::Ncp).expect("valid config"),
            host_port: BufferedPort::new(64),
            ncp_port: BufferedPort::new(64),
            to_ncp: Wire::new(seed),
            to_host: Wire::new(seed.wrapping_mul(31).wrapping_add(7)),
            host_received: Vec::new(),
            ncp_received: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Reset from the host side and run until both ends are connected.
    pub fn connected(config: AshConfig, seed: u32) -> Link {
        let mut link = Link::new(config, seed);
        link.host.reset();
        for _ in 0..8 {
            link.step();
            if link.host.is_connected() && link.ncp.is_connected() {
                return link;
            }
        }
        panic!("link did not connect: {:?}", link.errors);
    }

    pub fn set_faults(&mut self, faults: Faults) {
        self.to_ncp.set_faults(faults);
        self.to_host.set_faults(faults);
    }

    /// Let each side write, carry the bytes across and let the other side read.
    pub fn step(&mut self) {
        if let Err(err) = self.host.send_exec(&mut self.host_port) {
            self.errors.push(err);
        }
        self.to_ncp.transfer(&mut self.host_port, &mut self.ncp_port);
        drain(
            &mut self.ncp,
            &mut self.ncp_port,
            &mut self.ncp_received,
            &mut self.errors,
        );

        if let Err(err) = self.ncp.send_exec(&mut self.ncp_port) {
            self.errors.push(err);
        }
        self.to_host.transfer(&mut self.ncp_port, &mut self.host_port);
        drain(
            &mut self.host,
            &mut self.host_port,
            &mut self.host_received,
            &mut self.errors,
        );
    }

    pub fn is_idle(&self) -> bool {
        self.host.outstanding() == 0 && self.ncp.outstanding() == 0
    }
}

fn drain(engine: &mut Engine, port: &mut BufferedPort, out: &mut Vec<Bytes>, errors: &mut Vec<Error>) {
    loop {
        match engine.receive(port) {
            Ok(Some(payload)) => out.push(payload),
            Ok(None) => break,
            Err(err) => errors.push(err),
        }
    }
}
