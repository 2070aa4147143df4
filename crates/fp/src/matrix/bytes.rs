use crate::{
    error::{storage_len, try_resize, try_zeroed, Result},
    limb::round_up,
    prime::ValidPrime,
};

/// Row-major storage with one byte per entry, shared by the byte-valued encodings. The encodings
/// differ only in how far rows are padded and in how they combine rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct ByteRows {
    pub(super) p: ValidPrime,
    pub(super) rows: usize,
    pub(super) columns: usize,
    pub(super) stride: usize,
    pub(super) data: Vec<u8>,
}

impl ByteRows {
    /// `align` is the granularity rows are padded to, and must be a power of two.
    pub(super) fn new(p: ValidPrime, rows: usize, columns: usize, align: usize) -> Result<Self> {
        let stride = round_up(columns, align);
        Ok(Self {
            p,
            rows,
            columns,
            stride,
            data: try_zeroed(storage_len(rows, stride))?,
        })
    }

    /// The full padded row.
    pub(super) fn row(&self, row: usize) -> &[u8] {
        assert!(row < self.rows, "row {row} out of range ({} rows)", self.rows);
        &self.data[row * self.stride..(row + 1) * self.stride]
    }

    pub(super) fn row_mut(&mut self, row: usize) -> &mut [u8] {
        assert!(row < self.rows, "row {row} out of range ({} rows)", self.rows);
        &mut self.data[row * self.stride..(row + 1) * self.stride]
    }

    /// Borrow a row mutably together with a different row immutably.
    pub(super) fn split_rows(&mut self, target: usize, source: usize) -> (&mut [u8], &[u8]) {
        assert_ne!(target, source, "cannot combine a row with itself");
        assert!(target < self.rows && source < self.rows);
        let stride = self.stride;
        if target < source {
            let (head, tail) = self.data.split_at_mut(source * stride);
            (&mut head[target * stride..(target + 1) * stride], &tail[..stride])
        } else {
            let (head, tail) = self.data.split_at_mut(target * stride);
            (&mut tail[..stride], &head[source * stride..(source + 1) * stride])
        }
    }

    pub(super) fn entry(&self, row: usize, column: usize) -> u32 {
        assert!(
            column < self.columns,
            "column {column} out of range ({} columns)",
            self.columns
        );
        self.row(row)[column] as u32
    }

    pub(super) fn set_entry(&mut self, row: usize, column: usize, value: u32) {
        assert!(
            column < self.columns,
            "column {column} out of range ({} columns)",
            self.columns
        );
        let value = (value % self.p.as_u32()) as u8;
        self.row_mut(row)[column] = value;
    }

    pub(super) fn copy_row_from(&mut self, target: usize, other: &Self, source: usize) {
        assert_eq!(self.p, other.p);
        assert_eq!(self.columns, other.columns);
        self.row_mut(target).copy_from_slice(other.row(source));
    }

    pub(super) fn copy_row_within(&mut self, target: usize, source: usize) {
        assert!(target < self.rows && source < self.rows);
        let stride = self.stride;
        self.data
            .copy_within(source * stride..(source + 1) * stride, target * stride);
    }

    pub(super) fn resize_rows(&mut self, rows: usize) -> Result<()> {
        try_resize(&mut self.data, storage_len(rows, self.stride))?;
        self.rows = rows;
        Ok(())
    }

    pub(super) fn set_to_zero(&mut self) {
        self.data.fill(0);
    }
}
