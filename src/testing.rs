//! In-memory register file that answers like a TCS34725

extern crate std;

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use crate::ll::{self, masks, registers, CommandType, RegisterBus};
use crate::types::RawSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FakeFault {
    /// Reject every transaction
    All,
    /// Reject writes selecting this command byte
    WriteTo(u8),
    /// Reject reads selecting this command byte
    ReadFrom(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FakeBusError;

#[derive(Debug)]
struct ChipState {
    registers: [u8; 32],
    writes: Vec<u8>,
    reads: Vec<u8>,
    fault: Option<FakeFault>,
}

/// Clones share one register file
#[derive(Debug, Clone)]
pub(crate) struct FakeChip {
    state: Rc<RefCell<ChipState>>,
}

impl FakeChip {
    pub(crate) fn new() -> Self {
        let mut registers = [0u8; 32];
        registers[usize::from(registers::ID)] = ll::CHIP_ID;
        registers[usize::from(registers::ATIME)] = 0xFF;
        registers[usize::from(registers::WTIME)] = 0xFF;
        Self {
            state: Rc::new(RefCell::new(ChipState {
                registers,
                writes: Vec::new(),
                reads: Vec::new(),
                fault: None,
            })),
        }
    }

    pub(crate) fn with_id(id: u8) -> Self {
        let chip = Self::new();
        chip.set_register(registers::ID, id);
        chip
    }

    pub(crate) fn register(&self, address: u8) -> u8 {
        self.state.borrow().registers[usize::from(address)]
    }

    pub(crate) fn set_register(&self, address: u8, value: u8) {
        self.state.borrow_mut().registers[usize::from(address)] = value;
    }

    pub(crate) fn set_fault(&self, fault: Option<FakeFault>) {
        self.state.borrow_mut().fault = fault;
    }

    /// Command bytes of every accepted write, in order
    pub(crate) fn writes(&self) -> Vec<u8> {
        self.state.borrow().writes.clone()
    }

    /// Command bytes of every accepted read, in order
    pub(crate) fn reads(&self) -> Vec<u8> {
        self.state.borrow().reads.clone()
    }

    pub(crate) fn set_sample(&self, sample: RawSample) {
        let channels = [sample.clear, sample.red, sample.green, sample.blue];
        for (i, value) in channels.into_iter().enumerate() {
            let [lo, hi] = value.to_le_bytes();
            let base = usize::from(registers::CDATAL) + i * 2;
            let mut state = self.state.borrow_mut();
            state.registers[base] = lo;
            state.registers[base + 1] = hi;
        }
        self.set_register(registers::STATUS, self.register(registers::STATUS) | masks::STATUS_AVALID);
    }

    pub(crate) fn raise_interrupt(&self) {
        self.set_register(registers::STATUS, self.register(registers::STATUS) | masks::STATUS_AINT);
    }

    pub(crate) fn interrupt_pending(&self) -> bool {
        self.register(registers::STATUS) & masks::STATUS_AINT != 0
    }

    fn decode(command: u8) -> (CommandType, usize) {
        assert!(command & ll::COMMAND_BIT != 0, "command bit missing");
        let kind = match (command >> 5) & 0b11 {
            0b00 => CommandType::RepeatedByte,
            0b01 => CommandType::AutoIncrement,
            0b11 => CommandType::Special,
            other => panic!("reserved command type {other:#b}"),
        };
        (kind, usize::from(command & registers::MAX_ADDRESS))
    }

    fn check(&self, rejected: impl Fn(FakeFault) -> bool) -> Result<(), FakeBusError> {
        match self.state.borrow().fault {
            Some(fault) if fault == FakeFault::All || rejected(fault) => Err(FakeBusError),
            _ => Ok(()),
        }
    }
}

impl RegisterBus for FakeChip {
    type Error = FakeBusError;

    async fn read(&mut self, command: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.check(|fault| fault == FakeFault::ReadFrom(command))?;
        let (kind, address) = Self::decode(command);
        let mut state = self.state.borrow_mut();
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = match kind {
                CommandType::AutoIncrement => state.registers[(address + i) % 32],
                _ => state.registers[address],
            };
        }
        state.reads.push(command);
        Ok(())
    }

    async fn write(&mut self, command: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.check(|fault| fault == FakeFault::WriteTo(command))?;
        let (kind, address) = Self::decode(command);
        let mut state = self.state.borrow_mut();
        for (i, byte) in data.iter().enumerate() {
            let target = match kind {
                CommandType::AutoIncrement => (address + i) % 32,
                _ => address,
            };
            state.registers[target] = *byte;
        }
        state.writes.push(command);
        Ok(())
    }

    async fn write_special(&mut self, command: u8) -> Result<(), Self::Error> {
        self.check(|fault| fault == FakeFault::WriteTo(command))?;
        let (kind, function) = Self::decode(command);
        assert_eq!(kind, CommandType::Special);
        let mut state = self.state.borrow_mut();
        if function == usize::from(ll::special::CLEAR) {
            state.registers[usize::from(registers::STATUS)] &= !masks::STATUS_AINT;
        }
        state.writes.push(command);
        Ok(())
    }
}
