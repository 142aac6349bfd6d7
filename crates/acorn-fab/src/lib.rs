//! Fabrication geometry for segmented concrete shells.
//!
//! Each shell segment is cast on an adjustable pinbed mould made of
//! rectangular modules. This crate fits a bounding box to a segment, tiles
//! its base with modules, simulates the pin heights under the shell and lays
//! out the springs that connect neighbouring segments in the structural
//! model. [`keystone`] derives the segmentation itself from two families of
//! stress lines.

pub mod bounding_box;
pub mod error;
pub mod keystone;
pub mod modules;
pub mod pinbed;
pub mod springs;

pub use bounding_box::{BoundingBoxConfig, fit_bounding_box};
pub use error::{FabError, Result};
pub use keystone::{KeystonePlan, keystone_plan, shell_centroid};
pub use modules::{area_efficiency, fit_modules};
pub use pinbed::{Color, ModulePins, Pin, PinbedConfig, PinbedLayout, simulate_pinbed};
pub use springs::{
    SPRING_ELEMENT_ID, SpringConfig, SpringCrossSection, SpringElement, SpringInterface,
    SpringLayout, make_springs, spring_elements,
};
