//! Vehicle classes distinguished by the emission model.
//!
//! Road-noise guidelines split traffic into passenger cars and heavy goods
//! vehicles; the heavy-vehicle share of a link's traffic is one of the three
//! inputs of the emission formula.

/// The acoustic class of a vehicle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleClass {
    /// Passenger car (and anything acoustically similar).
    #[default]
    Car,
    /// Heavy goods vehicle (> 2.8 t).
    Hgv,
}

impl VehicleClass {
    /// `true` for heavy goods vehicles.
    #[inline]
    pub fn is_heavy(self) -> bool {
        matches!(self, VehicleClass::Hgv)
    }

    /// Human-readable label, useful for CSV/Parquet column values.
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Hgv => "hgv",
        }
    }
}

impl std::fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VehicleClass {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "car" => Ok(VehicleClass::Car),
            "hgv" => Ok(VehicleClass::Hgv),
            other => Err(crate::CoreError::Parse(format!(
                "invalid vehicle class {other:?}: expected \"car\" or \"hgv\""
            ))),
        }
    }
}
