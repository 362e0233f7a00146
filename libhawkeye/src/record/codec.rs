use super::{Availability, DataType, FieldId, PointRecord, Value};
use tracing::trace;

/// One declared field of a file: which record member it fills and how it is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    /// The record member the field is bound to
    pub field: FieldId,
    /// The on-disk type of the field
    pub data_type: DataType,
}

/// The per-file layout of a packed point record
///
/// Built once when a file is opened, from the tags and type codes of its contents header.
/// Fields are packed back to back in declaration order, without padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    slots: Vec<FieldSlot>,
    availability: Availability,
    record_size: usize,
}

/// Sum of the widths of `slots`
pub(crate) fn packed_size(slots: &[FieldSlot]) -> usize {
    slots.iter().map(|s| s.data_type.width()).sum()
}

/// Equality that also treats two NaNs as the same value
fn same_value(a: Value, b: Value) -> bool {
    a == b || (a.as_f64().is_nan() && b.as_f64().is_nan())
}

impl Schema {
    /// Creates a new [`Schema`]
    ///
    /// Returns [`None`] if the packed fields do not fit into `record_size` bytes. A record size
    /// larger than the packed size is allowed, the remaining bytes are treated as padding.
    #[must_use]
    pub fn new(slots: Vec<FieldSlot>, record_size: usize) -> Option<Self> {
        if packed_size(&slots) > record_size {
            return None;
        }
        let availability = slots.iter().map(|s| s.field).collect();
        Some(Self {
            slots,
            availability,
            record_size,
        })
    }

    /// Returns the declared fields in file order
    #[must_use]
    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }

    /// Returns the set of record members this layout fills
    #[must_use]
    pub const fn availability(&self) -> &Availability {
        &self.availability
    }

    /// Returns the size of one record on disk
    #[must_use]
    pub const fn record_size(&self) -> usize {
        self.record_size
    }

    /// Packs `record` into `out`
    ///
    /// Only the declared fields are written; padding bytes are zeroed.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than [`Self::record_size`]
    pub fn pack(&self, record: &PointRecord, out: &mut [u8]) {
        let out = &mut out[..self.record_size];
        let mut pos = 0;
        for slot in &self.slots {
            let width = slot.data_type.width();
            slot.data_type
                .encode(record.get(slot.field), &mut out[pos..pos + width]);
            pos += width;
        }
        out[pos..].fill(0);
    }

    /// Packs `record` over the record already stored in `out`
    ///
    /// A field whose member still holds the value read from `out` keeps its stored bytes, so
    /// fields stored wider than their member are not narrowed by an unchanged write back.
    /// Padding bytes are left as they are.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than [`Self::record_size`]
    pub fn repack(&self, record: &PointRecord, out: &mut [u8]) {
        let stored = self.unpack(out);
        let mut pos = 0;
        for slot in &self.slots {
            let width = slot.data_type.width();
            let value = record.get(slot.field);
            if same_value(stored.get(slot.field), value) {
                trace!("kept stored {:?}", slot.field);
            } else {
                slot.data_type.encode(value, &mut out[pos..pos + width]);
            }
            pos += width;
        }
    }

    /// Unpacks a record from `buf`
    ///
    /// Members not declared by this layout are left at zero. The derived time members
    /// ([`PointRecord::tv_sec`], [`PointRecord::tv_nsec`]) are not set here.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`Self::record_size`]
    #[must_use]
    pub fn unpack(&self, buf: &[u8]) -> PointRecord {
        let buf = &buf[..self.record_size];
        let mut record = PointRecord::default();
        let mut pos = 0;
        for slot in &self.slots {
            let width = slot.data_type.width();
            let value = slot.data_type.decode(&buf[pos..pos + width]);
            trace!("unpacked {:?} = {value}", slot.field);
            record.set(slot.field, value);
            pos += width;
        }
        record
    }
}
