use serde::{Deserialize, Deserializer};

// The empty_string_is_none deserializer from the serde issue
// tracker never worked for me when combined with Option and
// default, so I'm doing empty string to None in the DTO
// conversions using a plain old function:
pub fn empty_string_to_none(value: Option<String>) -> Option<String> {
  match value {
    Some(s) => if s.trim().is_empty()
      { None } else { Some(s) },
    None => None
  }
}

// Used for fields where "absent" and "null" mean different
// things in update requests:
// - absent => Option::None (leave the field alone)
// - null => Some(None) (clear the field)
// - value => Some(Some(value))
// Has to be combined with #[serde(default)] or absent fields
// error out.
pub fn deserialize_null_value<'de, T, D>(
  deserializer: D
) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}
