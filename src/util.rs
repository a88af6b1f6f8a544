// Copyright (C) 2020-2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use serde::de::value::Error as ValueError;
use serde::de::IntoDeserializer as _;
use serde::Deserialize;
use serde::Serialize;
use serde_variant::to_variant_name;

use crate::Error;


/// Implement `Display` and `FromStr` for a field-less enum in terms of
/// the names its variants have on the wire.
macro_rules! impl_variant_str {
  ($ty:ty) => {
    #[allow(unused_qualifications)]
    impl ::std::fmt::Display for $ty {
      fn fmt(&self, fmt: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        fmt.write_str(crate::util::variant_name(self))
      }
    }

    #[allow(unused_qualifications)]
    impl ::std::str::FromStr for $ty {
      type Err = crate::Error;

      fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
        crate::util::variant_from_str(s)
      }
    }
  };
}


/// Retrieve the name an enum variant is serialized as.
///
/// # Notes
/// - this function should only be used for cases where `T` is a
///   field-less enum type
pub(crate) fn variant_name<T>(variant: &T) -> &'static str
where
  T: Serialize,
{
  // We know that we are dealing with a unit enum variant and the
  // function will never return an error for those, so it's fine to
  // unwrap.
  to_variant_name(variant).unwrap()
}


/// Parse an enum variant from the name it is serialized as.
pub(crate) fn variant_from_str<'de, T>(s: &'de str) -> Result<T, Error>
where
  T: Deserialize<'de>,
{
  T::deserialize(s.into_deserializer())
    .map_err(|err: ValueError| Error::RequestBuild(err.to_string().into()))
}


/// Check whether a flag is unset, for skipping its serialization.
#[allow(clippy::trivially_copy_pass_by_ref)]
pub(crate) fn is_false(value: &bool) -> bool {
  !*value
}
