use anyhow::Result;

use crate::Way;

/// Holds the member ways collected for the relations being assembled and
/// hands out opaque 64-bit offsets for random access. The assembler only ever
/// reads from this; whoever collects the members writes to it.
#[derive(Clone, Debug, Default)]
pub struct WayBuffer {
    ways: Vec<Way>,
}

impl WayBuffer {
    pub fn new() -> WayBuffer {
        WayBuffer { ways: Vec::new() }
    }

    /// Appends a way and returns the offset to fetch it back by.
    pub fn add_way(&mut self, way: Way) -> u64 {
        self.ways.push(way);
        (self.ways.len() - 1) as u64
    }

    pub fn get(&self, offset: u64) -> Result<&Way> {
        match self.ways.get(offset as usize) {
            Some(way) => Ok(way),
            None => bail!(
                "no way at offset {}; the buffer holds {}",
                offset,
                self.ways.len()
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.ways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ways.is_empty()
    }
}
