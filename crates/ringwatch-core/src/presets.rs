//! Bundled plant layouts.

use crate::cctv::{CctvConfig, CctvSite};
use crate::plant::PlantConfig;
use crate::roles::StrandRoles;

/// Identifier of the standard plant layout.
pub const STANDARD_PLANT_ID: &str = "Sabinar I";

/// The standard layout: 8 circuits, 22 field sites, 16-strand segments.
pub fn standard_plant() -> PlantConfig {
    let mut plant = PlantConfig::new(STANDARD_PLANT_ID)
        .with_circuit("C1", ["CT21", "CT22"])
        .with_circuit("C2", ["CT12", "CT19", "CT20"])
        .with_circuit("C3", ["CT16", "CT17", "CT18"])
        .with_circuit("C4", ["CT13", "CT14", "CT15"])
        .with_circuit("C5", ["CT07", "CT10", "CT11"])
        .with_circuit("C6", ["CT04", "CT05", "CT06"])
        .with_circuit("C7", ["CT01", "CT02", "CT03"])
        .with_circuit("C8", ["CT09", "CT08"])
        .with_roles(StrandRoles::default());

    let positions = [
        ("SET", [39.5000, -2.0000]),
        ("CT01", [39.4950, -2.0050]),
        ("CT02", [39.4930, -2.0100]),
        ("CT03", [39.4910, -2.0150]),
        ("CT04", [39.4890, -2.0200]),
        ("CT05", [39.4870, -2.0250]),
        ("CT06", [39.4850, -2.0300]),
        ("CT07", [39.4830, -2.0350]),
        ("CT08", [39.4810, -2.0400]),
        ("CT09", [39.4790, -2.0450]),
        ("CT10", [39.4770, -2.0500]),
        ("CT11", [39.4750, -2.0550]),
        ("CT12", [39.5050, -2.0050]),
        ("CT13", [39.5070, -2.0100]),
        ("CT14", [39.5090, -2.0150]),
        ("CT15", [39.5110, -2.0200]),
        ("CT16", [39.5130, -2.0250]),
        ("CT17", [39.5150, -2.0300]),
        ("CT18", [39.5170, -2.0350]),
        ("CT19", [39.5190, -2.0400]),
        ("CT20", [39.5210, -2.0450]),
        ("CT21", [39.5230, -2.0500]),
        ("CT22", [39.5250, -2.0550]),
    ];
    plant.positions = positions
        .into_iter()
        .map(|(id, pos)| (id.to_string(), pos))
        .collect();
    plant
}

/// Bundled CCTV inventory for `plant_id`; empty for plants without one.
pub fn standard_cctv(plant_id: &str) -> CctvConfig {
    if plant_id != STANDARD_PLANT_ID {
        return CctvConfig::new();
    }
    CctvConfig::new()
        .with_site("CT01", CctvSite::new(2, ["B01", "B02"]))
        .with_site("CT05", CctvSite::new(1, ["B03"]))
        .with_site("CT10", CctvSite::new(3, ["B04", "B05", "B06"]))
        .with_site("CT15", CctvSite::new(2, ["B07", "B08"]))
        .with_site("CT20", CctvSite::new(1, ["B09"]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_plant_shape() {
        let plant = standard_plant();
        plant.validate().unwrap();
        assert_eq!(plant.circuits.len(), 8);
        assert_eq!(plant.ring_order.len(), 8);
        assert_eq!(plant.field_ids().len(), 22);
        assert_eq!(plant.positions.len(), 23);
    }

    #[test]
    fn standard_cctv_sits_on_plant_nodes() {
        let plant = standard_plant();
        let cctv = standard_cctv(&plant.id);
        assert_eq!(cctv.sites.len(), 5);
        assert_eq!(cctv.total_cameras(), 9);
        assert!(cctv.unknown_sites(&plant.field_ids()).is_empty());
        assert!(standard_cctv("elsewhere").is_empty());
    }
}
