//! Habitat assessment of one management unit
//!
//! Wires the terrain, vector, proximity, classification and suitability
//! steps together:
//!
//! ```text
//! DEM + boundary ─▶ clip ─▶ slope ──────────────────────────▶ score ─┐
//!                     │                                              │
//! roads ─▶ [connect] ─▶ rasterize ─▶ distance ───────────────────▶ score ─┼─▶ combine
//! water + flowlines ─▶ [connect] ─▶ rasterize ─▶ distance ───────▶ score ─┘
//!                     │
//!                     └─▶ elevation bands / steep slopes ─▶ vectorize
//! ```

use crate::classification::{band_edges, classify, threshold_mask, vectorize, BandLabels};
use crate::proximity::{distance_field, rasterize, DistanceField};
use crate::suitability::{combine, Criterion, Desirability, SuitabilityConfig};
use crate::terrain::{clip_to_boundary, slope, SlopeParams};
use crate::vector::filter_connected;
use tracing::{debug, info, warn};
use wildhab_core::crs::{crs_matches, CRS};
use wildhab_core::raster::Raster;
use wildhab_core::vector::{AttributeValue, FeatureCollection, LineNetwork};
use wildhab_core::{Error, Result};

/// Attribute carrying the elevation band class
pub const BAND_ATTRIBUTE: &str = "band_id";

/// Attribute carrying the steep-slope class
pub const SLOPE_CLASS_ATTRIBUTE: &str = "slope_class";

/// Everything known about one unit before assessment
#[derive(Debug, Clone)]
pub struct UnitInputs {
    /// Elevation in metres, covering at least the unit
    pub dem: Raster<f64>,
    /// Polygonal unit boundary, same CRS as the DEM
    pub boundary: FeatureCollection,
    pub roads: LineNetwork,
    /// Lakes, ponds and other water polygons
    pub waterbodies: FeatureCollection,
    pub flowlines: LineNetwork,
}

/// Products of [`assess_unit`]; all grids share the clipped DEM's grid
#[derive(Debug, Clone)]
pub struct HabitatAssessment {
    /// DEM cropped to the unit; cells outside the boundary are invalid
    pub dem: Raster<f64>,
    /// Slope in degrees
    pub slope: Raster<f64>,
    pub road_distance: DistanceField,
    pub water_distance: DistanceField,
    /// Weighted suitability, 0-100
    pub composite: Raster<f64>,
    /// Elevation band polygons with display labels
    pub elevation_bands: FeatureCollection,
    /// Polygons of ground steeper than the configured threshold
    pub steep_slopes: FeatureCollection,
}

/// Run the full assessment for one unit.
///
/// # Errors
/// - [`Error::InvalidConfiguration`] if `config` fails validation
/// - [`Error::UpstreamFailure`] for an unusable DEM or boundary
/// - [`Error::ShapeMismatch`] when a non-empty layer's CRS differs from the DEM's
pub fn assess_unit(inputs: UnitInputs, config: &SuitabilityConfig) -> Result<HabitatAssessment> {
    config.validate()?;
    let UnitInputs {
        dem,
        boundary,
        roads,
        waterbodies,
        flowlines,
    } = inputs;

    info!("Input: {} x {}", dem.cols(), dem.rows());
    let dem = clip_to_boundary(&dem, &boundary)?;
    let crs = dem.crs().cloned();
    info!(
        "Clipped to unit: {} x {}, {} valid cells",
        dem.cols(),
        dem.rows(),
        dem.valid_count()
    );

    check_layer_crs("roads", roads.crs(), roads.is_empty(), crs.as_ref())?;
    check_layer_crs("waterbodies", waterbodies.crs(), waterbodies.is_empty(), crs.as_ref())?;
    check_layer_crs("flowlines", flowlines.crs(), flowlines.is_empty(), crs.as_ref())?;

    let slope_deg = slope(&dem, dem.cell_width(), dem.cell_height(), SlopeParams::default())?;
    debug!("Slope computed");

    // Scoring keeps unnamed streams; only isolated fragments are dropped
    let (roads, flowlines) = if config.clean_networks {
        let tolerance = config.connectivity_tolerance;
        (
            filter_connected(&roads, tolerance)?,
            filter_connected(&flowlines, tolerance)?,
        )
    } else {
        (roads, flowlines)
    };

    let mut water = FeatureCollection::new(crs.clone());
    water.features.extend(waterbodies.features);
    water.features.extend(flowlines.into_collection().features);
    info!(
        "Rasterizing {} road and {} water features",
        roads.len(),
        water.len()
    );

    let road_presence =
        rasterize(roads.as_collection(), dem.shape(), dem.transform())?.with_crs(crs.clone());
    let water_presence = rasterize(&water, dem.shape(), dem.transform())?.with_crs(crs.clone());
    dem.ensure_same_grid(&road_presence)?;
    dem.ensure_same_grid(&water_presence)?;

    let road_distance = distance_field(&road_presence, dem.cell_width(), dem.cell_height())?;
    let water_distance = distance_field(&water_presence, dem.cell_width(), dem.cell_height())?;
    if !road_distance.has_sources() {
        debug!("No roads in unit; road criterion scores 1 everywhere");
    }
    if !water_distance.has_sources() {
        warn!("No water in unit; water criterion scores 0 everywhere");
    }

    let weights = &config.weights;
    let criteria = [
        Criterion::new("slope", config.slope.score_grid(&slope_deg), weights.slope),
        Criterion::new("water", config.resource.score_field(&water_distance), weights.water),
        Criterion::new("roads", config.hazard.score_field(&road_distance), weights.roads),
    ];
    let composite = combine(&criteria, &dem)?;
    info!("Composite suitability: {} valid cells", composite.valid_count());

    let elevation_bands = elevation_bands(&dem, config.classification.elevation_interval)?;
    let steep_slopes = steep_slopes(&slope_deg, config.classification.steep_threshold)?;
    info!(
        "Vectorized {} elevation bands and {} steep areas",
        elevation_bands.len(),
        steep_slopes.len()
    );

    Ok(HabitatAssessment {
        dem,
        slope: slope_deg,
        road_distance,
        water_distance,
        composite,
        elevation_bands,
        steep_slopes,
    })
}

fn check_layer_crs(
    layer: &str,
    layer_crs: Option<&CRS>,
    empty: bool,
    dem_crs: Option<&CRS>,
) -> Result<()> {
    if empty || crs_matches(layer_crs, dem_crs) {
        return Ok(());
    }
    Err(Error::ShapeMismatch(format!(
        "{} layer CRS {:?} differs from DEM CRS {:?}",
        layer,
        layer_crs.map(CRS::identifier),
        dem_crs.map(CRS::identifier)
    )))
}

/// Elevation band polygons at `interval` metres
pub fn elevation_bands(dem: &Raster<f64>, interval: f64) -> Result<FeatureCollection> {
    let stats = dem.statistics();
    let (Some(min), Some(max)) = (stats.min, stats.max) else {
        return Ok(FeatureCollection::new(dem.crs().cloned()));
    };

    let edges = band_edges(min, max, interval)?;
    debug!(
        "Elevation {:.1}..{:.1} m split into {} bands",
        min,
        max,
        edges.len() - 1
    );
    let labels = BandLabels::new(edges);
    let classes = classify(dem, labels.interior_edges())?;
    Ok(vectorize(&classes, BAND_ATTRIBUTE, |class| labels.properties(class)))
}

/// Polygons of cells steeper than `threshold` degrees
pub fn steep_slopes(slope_deg: &Raster<f64>, threshold: f64) -> Result<FeatureCollection> {
    let mask = threshold_mask(slope_deg, threshold)?;
    let label = format!("> {} degrees", threshold);
    Ok(vectorize(&mask, SLOPE_CLASS_ATTRIBUTE, |_| {
        vec![
            ("label".to_string(), AttributeValue::String(label.clone())),
            ("min_deg".to_string(), AttributeValue::Float(threshold)),
        ]
    }))
}
