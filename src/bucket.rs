//! Bucket assignment: `id mod bucket_count`.

use arrow::array::{Array, AsArray, BooleanArray, UInt64Array};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::constants::ID_COLUMN;
use crate::error::{HiveError, Result};

/// Reject a zero bucket count.
pub fn check_bucket_count(bucket_count: u64) -> Result<()> {
    if bucket_count == 0 {
        return Err(HiveError::config("bucket_count must be > 0"));
    }
    Ok(())
}

/// Bucket of an unsigned identifier.
pub fn assign(id: u64, bucket_count: u64) -> Result<u64> {
    check_bucket_count(bucket_count)?;
    Ok(id % bucket_count)
}

/// Bucket of a signed identifier. Uses the Euclidean remainder so negative
/// ids still land in `[0, bucket_count)`.
pub fn assign_signed(id: i64, bucket_count: u64) -> Result<u64> {
    check_bucket_count(bucket_count)?;
    Ok(i128::from(id).rem_euclid(i128::from(bucket_count)) as u64)
}

/// An identifier as stored in an integer `id` column.
///
/// Signed and unsigned ids compare by numeric value, so `Signed(5)` equals
/// `Unsigned(5)` while `Unsigned(1 << 63)` matches no signed id.
#[derive(Debug, Clone, Copy)]
pub enum RecordId {
    Signed(i64),
    Unsigned(u64),
}

impl RecordId {
    /// Bucket of this id.
    pub fn bucket(self, bucket_count: u64) -> Result<u64> {
        match self {
            RecordId::Signed(id) => assign_signed(id, bucket_count),
            RecordId::Unsigned(id) => assign(id, bucket_count),
        }
    }

    fn widened(self) -> i128 {
        match self {
            RecordId::Signed(id) => i128::from(id),
            RecordId::Unsigned(id) => i128::from(id),
        }
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.widened() == other.widened()
    }
}

impl Eq for RecordId {}

macro_rules! record_id_from {
    ($variant:ident: $($native:ty),+) => {
        $(
            impl From<$native> for RecordId {
                fn from(id: $native) -> Self {
                    RecordId::$variant(id.into())
                }
            }
        )+
    };
}

record_id_from!(Signed: i8, i16, i32, i64);
record_id_from!(Unsigned: u8, u16, u32, u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Signed(id) => write!(f, "{}", id),
            RecordId::Unsigned(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for RecordId {
    type Err = String;

    /// Non-negative values parse as unsigned so the full `u64` range is reachable.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(RecordId::Unsigned)
            .or_else(|_| s.parse::<i64>().map(RecordId::Signed))
            .map_err(|_| format!("'{}' is not an integer id", s))
    }
}

/// Read an integer `id` column as [`RecordId`]s, `None` for nulls.
///
/// `origin` is only used to name the offending file in errors.
pub fn record_ids(ids: &dyn Array, origin: &Path) -> Result<Vec<Option<RecordId>>> {
    match ids.data_type() {
        DataType::Int8 => Ok(ids_of::<Int8Type>(ids)),
        DataType::Int16 => Ok(ids_of::<Int16Type>(ids)),
        DataType::Int32 => Ok(ids_of::<Int32Type>(ids)),
        DataType::Int64 => Ok(ids_of::<Int64Type>(ids)),
        DataType::UInt8 => Ok(ids_of::<UInt8Type>(ids)),
        DataType::UInt16 => Ok(ids_of::<UInt16Type>(ids)),
        DataType::UInt32 => Ok(ids_of::<UInt32Type>(ids)),
        DataType::UInt64 => Ok(ids_of::<UInt64Type>(ids)),
        other => Err(HiveError::input(
            origin,
            format!("column '{}' must be an integer type, got {:?}", ID_COLUMN, other),
        )),
    }
}

fn ids_of<T>(ids: &dyn Array) -> Vec<Option<RecordId>>
where
    T: ArrowPrimitiveType,
    T::Native: Into<RecordId>,
{
    ids.as_primitive::<T>()
        .iter()
        .map(|id| id.map(Into::into))
        .collect()
}

/// Compute the bucket of every row of an integer `id` column.
///
/// `origin` is only used to name the offending file in errors.
///
/// # Errors
/// - `bucket_count == 0`
/// - the column is not an integer type
/// - the column contains nulls
pub fn bucket_column(ids: &dyn Array, bucket_count: u64, origin: &Path) -> Result<UInt64Array> {
    check_bucket_count(bucket_count)?;

    let buckets = record_ids(ids, origin)?
        .into_iter()
        .enumerate()
        .map(|(row, id)| match id {
            Some(id) => id.bucket(bucket_count),
            None => Err(HiveError::input(
                origin,
                format!("null '{}' at row {}", ID_COLUMN, row),
            )),
        })
        .collect::<Result<Vec<u64>>>()?;

    Ok(UInt64Array::from(buckets))
}

/// Rows of an integer `id` column equal to `id`, compared by numeric value.
pub fn id_mask(ids: &dyn Array, id: RecordId, origin: &Path) -> Result<BooleanArray> {
    Ok(record_ids(ids, origin)?
        .into_iter()
        .map(|value| Some(value == Some(id)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int32Array, Int64Array, Int8Array};

    #[test]
    fn test_assign_matches_modulo() {
        for bucket_count in [1u64, 2, 7, 256, 1000] {
            for id in (0u64..5_000).chain([u64::MAX - 1, u64::MAX]) {
                let bucket = assign(id, bucket_count).unwrap();
                assert_eq!(bucket, id % bucket_count);
                assert!(bucket < bucket_count);
            }
        }
    }

    #[test]
    fn test_assign_zero_bucket_count_is_config_error() {
        assert!(matches!(assign(10, 0), Err(HiveError::Config(_))));
        assert!(matches!(assign_signed(10, 0), Err(HiveError::Config(_))));
    }

    #[test]
    fn test_assign_signed_negative_ids_stay_in_range() {
        assert_eq!(assign_signed(-1, 256).unwrap(), 255);
        assert_eq!(assign_signed(-256, 256).unwrap(), 0);
        assert_eq!(assign_signed(513, 256).unwrap(), 1);
        assert_eq!(assign_signed(i64::MIN, 256).unwrap(), 0);
    }

    #[test]
    fn test_bucket_column_int64() {
        let ids = Int64Array::from(vec![0, 255, 256, 999, 1024]);
        let buckets = bucket_column(&ids, 256, Path::new("a.parquet")).unwrap();
        assert_eq!(buckets.values().to_vec(), vec![0, 255, 0, 231, 0]);
    }

    #[test]
    fn test_bucket_column_uint64_large_values() {
        let ids = UInt64Array::from(vec![u64::MAX, 16290893548283143531]);
        let buckets = bucket_column(&ids, 256, Path::new("a.parquet")).unwrap();
        assert_eq!(buckets.value(0), u64::MAX % 256);
        assert_eq!(buckets.value(1), 16290893548283143531 % 256);
    }

    #[test]
    fn test_bucket_column_rejects_nulls() {
        let ids = Int32Array::from(vec![Some(1), None, Some(3)]);
        let err = bucket_column(&ids, 256, Path::new("sample.parquet")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("sample.parquet"));
        assert!(msg.contains("row 1"));
    }

    #[test]
    fn test_bucket_column_rejects_non_integer() {
        let ids = Float64Array::from(vec![1.0, 2.0]);
        let err = bucket_column(&ids, 256, Path::new("sample.parquet")).unwrap_err();
        assert!(matches!(err, HiveError::Input { .. }));
    }

    #[test]
    fn test_record_id_bucket_uses_matching_assigner() {
        let hashed = (1u64 << 63) | 5;
        assert_eq!(RecordId::Unsigned(hashed).bucket(256).unwrap(), 5);
        assert_eq!(RecordId::Signed(-1).bucket(256).unwrap(), 255);
        assert!(matches!(
            RecordId::Unsigned(1).bucket(0),
            Err(HiveError::Config(_))
        ));
    }

    #[test]
    fn test_record_id_compares_by_value() {
        assert_eq!(RecordId::Signed(5), RecordId::Unsigned(5));
        assert_ne!(RecordId::Signed(-1), RecordId::Unsigned(u64::MAX));
        let hashed = (1u64 << 63) | 5;
        assert_ne!(
            RecordId::Unsigned(hashed),
            RecordId::Signed(hashed as i64)
        );
    }

    #[test]
    fn test_record_id_from_str() {
        let hashed = (1u64 << 63) | 5;
        assert_eq!(
            hashed.to_string().parse::<RecordId>().unwrap(),
            RecordId::Unsigned(hashed)
        );
        assert!(matches!(
            "-42".parse::<RecordId>().unwrap(),
            RecordId::Signed(-42)
        ));
        assert!(matches!(
            "42".parse::<RecordId>().unwrap(),
            RecordId::Unsigned(42)
        ));
        assert!("4x2".parse::<RecordId>().is_err());
        assert_eq!(RecordId::Unsigned(hashed).to_string(), hashed.to_string());
    }

    #[test]
    fn test_bucket_column_small_signed_type() {
        let ids = Int8Array::from(vec![-1i8, 7, -128]);
        let buckets = bucket_column(&ids, 16, Path::new("a.parquet")).unwrap();
        assert_eq!(buckets.values().to_vec(), vec![15, 7, 0]);
    }

    #[test]
    fn test_id_mask_matches_unsigned_ids_above_i64_max() {
        let hashed = (1u64 << 63) | 5;
        let ids = UInt64Array::from(vec![Some(hashed), Some(5), None]);

        let mask = id_mask(&ids, RecordId::Unsigned(hashed), Path::new("a.parquet")).unwrap();
        assert_eq!(mask, BooleanArray::from(vec![true, false, false]));

        let mask = id_mask(&ids, RecordId::Signed(5), Path::new("a.parquet")).unwrap();
        assert_eq!(mask, BooleanArray::from(vec![false, true, false]));
    }
}
