// Routes module - route record model, routing table capture and archive codec

pub mod archive;
pub mod parser;

use serde::Serialize;
use std::fmt;

use crate::error::{AppError, AppResult};
use archive::FIELD_DELIMITER;

/// Address columns (destination, gateway, genmask)
pub const ADDRESS_FIELD_MAX: usize = 31;
/// Counter columns (metric, ref, use), wide enough for a u64
pub const COUNTER_FIELD_MAX: usize = 20;
/// Name columns (flags, iface), IFNAMSIZ - 1
pub const NAME_FIELD_MAX: usize = 15;

pub type AddressField = RouteField<ADDRESS_FIELD_MAX>;
pub type CounterField = RouteField<COUNTER_FIELD_MAX>;
pub type NameField = RouteField<NAME_FIELD_MAX>;

/// Opaque text value of one routing table column, at most `MAX` bytes long.
///
/// Values are copied verbatim from the source line. Oversized values and
/// values containing the archive delimiter are rejected, not truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RouteField<const MAX: usize>(String);

impl<const MAX: usize> RouteField<MAX> {
    pub fn new(field: &'static str, value: &str) -> AppResult<Self> {
        if value.len() > MAX {
            return Err(AppError::FieldTooLong {
                field,
                len: value.len(),
                max: MAX,
            });
        }
        if value.contains(FIELD_DELIMITER) {
            return Err(AppError::InvalidField {
                field,
                value: value.to_string(),
            });
        }
        Ok(RouteField(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const MAX: usize> fmt::Display for RouteField<MAX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the IPv4 routing table at capture time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteRecord {
    pub destination: AddressField,
    pub gateway: AddressField,
    pub genmask: AddressField,
    pub flags: NameField,
    pub metric: CounterField,
    #[serde(rename = "ref")]
    pub refs: CounterField,
    #[serde(rename = "use")]
    pub uses: CounterField,
    pub iface: NameField,
}

impl RouteRecord {
    pub const FIELD_COUNT: usize = 8;
    pub const FIELD_NAMES: [&'static str; Self::FIELD_COUNT] = [
        "destination",
        "gateway",
        "genmask",
        "flags",
        "metric",
        "ref",
        "use",
        "iface",
    ];

    /// Build a record from column values by position.
    ///
    /// Missing trailing columns stay empty and columns past the eighth are
    /// dropped. Callers decide whether a short or long row is worth a warning.
    pub fn from_fields<'a, I>(fields: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut columns = [""; Self::FIELD_COUNT];
        for (slot, value) in columns.iter_mut().zip(fields) {
            *slot = value;
        }
        let [destination, gateway, genmask, flags, metric, refs, uses, iface] = columns;
        let names = Self::FIELD_NAMES;

        Ok(RouteRecord {
            destination: RouteField::new(names[0], destination)?,
            gateway: RouteField::new(names[1], gateway)?,
            genmask: RouteField::new(names[2], genmask)?,
            flags: RouteField::new(names[3], flags)?,
            metric: RouteField::new(names[4], metric)?,
            refs: RouteField::new(names[5], refs)?,
            uses: RouteField::new(names[6], uses)?,
            iface: RouteField::new(names[7], iface)?,
        })
    }

    /// Column values in archive order
    pub fn fields(&self) -> [&str; Self::FIELD_COUNT] {
        [
            self.destination.as_str(),
            self.gateway.as_str(),
            self.genmask.as_str(),
            self.flags.as_str(),
            self.metric.as_str(),
            self.refs.as_str(),
            self.uses.as_str(),
            self.iface.as_str(),
        ]
    }
}

/// Canonical archive line, without the line terminator
impl fmt::Display for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.fields().iter().enumerate() {
            if i > 0 {
                write!(f, "{}", FIELD_DELIMITER)?;
            }
            f.write_str(value)?;
        }
        Ok(())
    }
}

/// Routing table at one point in time, in the order the kernel reported it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteSnapshot {
    routes: Vec<RouteRecord>,
}

impl RouteSnapshot {
    pub fn new(routes: Vec<RouteRecord>) -> Self {
        RouteSnapshot { routes }
    }

    #[cfg(test)]
    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<'a> IntoIterator for &'a RouteSnapshot {
    type Item = &'a RouteRecord;
    type IntoIter = std::slice::Iter<'a, RouteRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}
