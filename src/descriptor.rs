//! Minimal HID report descriptor walk.
//!
//! Only derives what the session needs: the byte length of the largest Input,
//! Output and Feature report, and whether the device uses numbered reports.
//! Lengths include one byte for the report ID, matching what Windows reports
//! in `HIDP_CAPS`.

use crate::report::Capabilities;
use log::{trace, warn};
use std::collections::HashMap;

const ITEM_TYPE_MAIN: u8 = 0;
const ITEM_TYPE_GLOBAL: u8 = 1;
const LONG_ITEM_PREFIX: u8 = 0xFE;

// Main item tags
const TAG_INPUT: u8 = 0x8;
const TAG_OUTPUT: u8 = 0x9;
const TAG_FEATURE: u8 = 0xB;

// Global item tags
const TAG_REPORT_SIZE: u8 = 0x7;
const TAG_REPORT_ID: u8 = 0x8;
const TAG_REPORT_COUNT: u8 = 0x9;
const TAG_PUSH: u8 = 0xA;
const TAG_POP: u8 = 0xB;

/// Report layout summary extracted from a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportLayout {
    pub capabilities: Capabilities,
    /// True if any Report ID item is present.
    pub numbered_reports: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct GlobalState {
    report_size: u32,
    report_count: u32,
    report_id: u8,
}

#[derive(Default)]
struct ReportBits {
    input: HashMap<u8, u64>,
    output: HashMap<u8, u64>,
    feature: HashMap<u8, u64>,
}

/// Walks the descriptor items and sums field bits per report kind and ID.
/// Truncated trailing items are ignored with a warning.
pub fn report_layout(descriptor: &[u8]) -> ReportLayout {
    let mut state = GlobalState::default();
    let mut stack: Vec<GlobalState> = Vec::new();
    let mut bits = ReportBits::default();
    let mut numbered_reports = false;
    let mut i = 0;

    while i < descriptor.len() {
        let prefix = descriptor[i];
        if prefix == LONG_ITEM_PREFIX {
            let size = descriptor.get(i + 1).copied().unwrap_or(0) as usize;
            i += 3 + size;
            continue;
        }
        let size = match prefix & 0x03 {
            3 => 4,
            n => n as usize,
        };
        let Some(data) = descriptor.get(i + 1..i + 1 + size) else {
            warn!("Report descriptor truncated at offset {}", i);
            break;
        };
        let value = data
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
        let item_type = (prefix >> 2) & 0x03;
        let tag = prefix >> 4;

        match (item_type, tag) {
            (ITEM_TYPE_GLOBAL, TAG_REPORT_SIZE) => state.report_size = value,
            (ITEM_TYPE_GLOBAL, TAG_REPORT_COUNT) => state.report_count = value,
            (ITEM_TYPE_GLOBAL, TAG_REPORT_ID) => {
                state.report_id = value as u8;
                numbered_reports = true;
            }
            (ITEM_TYPE_GLOBAL, TAG_PUSH) => stack.push(state),
            (ITEM_TYPE_GLOBAL, TAG_POP) => {
                if let Some(saved) = stack.pop() {
                    state = saved;
                }
            }
            (ITEM_TYPE_MAIN, TAG_INPUT | TAG_OUTPUT | TAG_FEATURE) => {
                let field_bits = u64::from(state.report_size) * u64::from(state.report_count);
                let map = match tag {
                    TAG_INPUT => &mut bits.input,
                    TAG_OUTPUT => &mut bits.output,
                    _ => &mut bits.feature,
                };
                *map.entry(state.report_id).or_insert(0) += field_bits;
            }
            _ => {}
        }
        i += 1 + size;
    }

    let layout = ReportLayout {
        capabilities: Capabilities {
            input_report_length: report_length(&bits.input),
            output_report_length: report_length(&bits.output),
            feature_report_length: report_length(&bits.feature),
        },
        numbered_reports,
    };
    trace!("Report layout: {:?}", layout);
    layout
}

fn report_length(bits: &HashMap<u8, u64>) -> u16 {
    bits.values()
        .max()
        .map(|&b| u16::try_from(b.div_ceil(8) + 1).unwrap_or(u16::MAX))
        .unwrap_or(0)
}
