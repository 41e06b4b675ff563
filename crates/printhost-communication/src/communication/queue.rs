//! Two-lane command queue
//!
//! Holds pending command text for the flow-control engine:
//! - a prioritized lane for manual/control commands, always serviced first
//! - a print lane derived from the active instruction file
//!
//! Print-lane commands are framed on the way out as `N<line> <command>*<checksum>`
//! so the firmware can detect dropped or corrupted lines.

use std::collections::VecDeque;

/// Delimiter between a framed command and its checksum
pub const CHECKSUM_DELIMITER: char = '*';

/// XOR of every byte of `framed` before the first checksum delimiter
pub fn checksum(framed: &str) -> u8 {
    framed
        .bytes()
        .take_while(|&b| b != CHECKSUM_DELIMITER as u8)
        .fold(0u8, |acc, b| acc ^ b)
}

/// Frame a print-lane command with its line number and checksum
pub fn frame_line(line_number: u64, command: &str) -> String {
    let numbered = format!("N{} {}", line_number, command);
    let sum = checksum(&numbered);
    format!("{}{}{}", numbered, CHECKSUM_DELIMITER, sum)
}

/// Pending commands for the printer
#[derive(Debug, Clone)]
pub struct CommandQueue {
    /// Manual/control commands, FIFO
    prioritized: VecDeque<String>,
    /// Print file commands, FIFO
    print_lane: VecDeque<String>,
    /// Line number the next print-lane frame gets
    next_line_number: u64,
}

impl CommandQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            prioritized: VecDeque::new(),
            print_lane: VecDeque::new(),
            next_line_number: 1,
        }
    }

    /// Append a command to the prioritized lane
    pub fn push_prioritized(&mut self, command: impl Into<String>) {
        self.prioritized.push_back(command.into());
    }

    /// Replace the print lane and restart line numbering at 1
    pub fn load_print_lane<I>(&mut self, commands: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.print_lane = commands.into_iter().collect();
        self.next_line_number = 1;
    }

    /// Pop the head of the prioritized lane
    pub fn pop_prioritized(&mut self) -> Option<String> {
        self.prioritized.pop_front()
    }

    /// Pop the head of the print lane, framed and numbered
    pub fn pop_print_frame(&mut self) -> Option<String> {
        let command = self.print_lane.pop_front()?;
        let framed = frame_line(self.next_line_number, &command);
        self.next_line_number += 1;
        Some(framed)
    }

    /// Drop everything in both lanes
    pub fn clear(&mut self) {
        self.prioritized.clear();
        self.print_lane.clear();
        self.next_line_number = 1;
    }

    /// Number of prioritized commands waiting
    pub fn prioritized_len(&self) -> usize {
        self.prioritized.len()
    }

    /// Number of print-lane commands waiting
    pub fn print_lane_len(&self) -> usize {
        self.print_lane.len()
    }

    /// Whether the print lane has work
    pub fn has_print_lines(&self) -> bool {
        !self.print_lane.is_empty()
    }

    /// Whether both lanes are empty
    pub fn is_empty(&self) -> bool {
        self.prioritized.is_empty() && self.print_lane.is_empty()
    }

    /// Line number the next print-lane frame will carry
    pub fn next_line_number(&self) -> u64 {
        self.next_line_number
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
