use anyhow::{bail, Context};
use artwalkcore::catalog::{Catalog, Coordinates, PositionSample, StepSample};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Offset of the starting point from the first artwork (~0.7 miles).
const START_OFFSET_DEG: f64 = 0.01;
/// Longest gap allowed between two generated fixes (one day).
const MAX_SAMPLE_INTERVAL_SECS: i64 = 86_400;

/// Configuration for generating a synthetic walk through the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    /// Position fixes between two consecutive artworks.
    pub points_per_leg: usize,
    /// Extra fixes taken while standing at each artwork.
    pub linger_points: usize,
    /// Maximum random offset applied to each fix, in degrees.
    pub jitter_deg: f64,
    pub steps_per_point: u64,
    pub step_jitter: u64,
    /// Cumulative counter value reported before the walk starts.
    pub start_steps: u64,
    pub sample_interval_secs: i64,
    /// Delay between producer pushes; zero replays as fast as possible.
    pub pace_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            points_per_leg: 12,
            linger_points: 3,
            jitter_deg: 0.00002,
            steps_per_point: 18,
            step_jitter: 4,
            start_steps: 0,
            sample_interval_secs: 10,
            pace_ms: 0,
        }
    }
}

impl GeneratorConfig {
    /// Rejects values that would make route or timestamp generation panic.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.jitter_deg.is_finite() || self.jitter_deg < 0.0 {
            bail!(
                "jitter_deg must be a finite, non-negative number of degrees (got {})",
                self.jitter_deg
            );
        }
        if self.sample_interval_secs > MAX_SAMPLE_INTERVAL_SECS {
            bail!(
                "sample_interval_secs must be at most {} (got {})",
                MAX_SAMPLE_INTERVAL_SECS,
                self.sample_interval_secs
            );
        }
        Ok(())
    }

    fn normalized_points(&self) -> usize {
        self.points_per_leg.max(1)
    }

    fn normalized_interval_secs(&self) -> i64 {
        self.sample_interval_secs.clamp(1, MAX_SAMPLE_INTERVAL_SECS)
    }
}

/// Both sensor feeds for one simulated walk, each in timestamp order.
#[derive(Debug, Clone)]
pub struct WalkPlan {
    pub positions: Vec<PositionSample>,
    pub steps: Vec<StepSample>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

fn build_route(catalog: &Catalog, config: &GeneratorConfig, rng: &mut StdRng) -> Vec<Coordinates> {
    let Some(first) = catalog.artworks().first() else {
        return Vec::new();
    };

    let mut route = Vec::new();
    let mut current = Coordinates::new(first.coords.latitude - START_OFFSET_DEG, first.coords.longitude);
    route.push(current);

    let points = config.normalized_points();
    for artwork in catalog.artworks() {
        let target = artwork.coords;
        for step in 1..=points {
            let fraction = step as f64 / points as f64;
            let waypoint = Coordinates::new(
                current.latitude + (target.latitude - current.latitude) * fraction,
                current.longitude + (target.longitude - current.longitude) * fraction,
            );
            route.push(jitter(waypoint, config.jitter_deg, rng));
        }
        for _ in 0..config.linger_points {
            route.push(jitter(target, config.jitter_deg, rng));
        }
        current = target;
    }
    route
}

fn jitter(point: Coordinates, max_deg: f64, rng: &mut StdRng) -> Coordinates {
    if max_deg <= 0.0 {
        return point;
    }
    Coordinates::new(
        point.latitude + rng.gen_range(-max_deg..max_deg),
        point.longitude + rng.gen_range(-max_deg..max_deg),
    )
}

pub fn build_walk_plan(
    catalog: &Catalog,
    config: &GeneratorConfig,
    started_at: DateTime<Utc>,
) -> anyhow::Result<WalkPlan> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let route = build_route(catalog, config, &mut rng);
    let interval_secs = config.normalized_interval_secs();
    let at_offset = |offset: i64| -> anyhow::Result<DateTime<Utc>> {
        let secs = interval_secs
            .checked_mul(offset)
            .context("overflow computing sample timestamp")?;
        started_at
            .checked_add_signed(Duration::seconds(secs))
            .context("sample timestamp out of range")
    };

    let mut positions = Vec::with_capacity(route.len());
    let mut steps = Vec::with_capacity(route.len() + 1);
    let mut cumulative = config.start_steps;
    steps.push(StepSample::new(cumulative, started_at));

    for (index, point) in route.iter().enumerate() {
        let offset = i64::try_from(index + 1).context("walk route too long")?;
        let timestamp = at_offset(offset)?;
        positions.push(PositionSample {
            coords: *point,
            timestamp,
        });

        let extra = if config.step_jitter > 0 {
            rng.gen_range(0..=config.step_jitter)
        } else {
            0
        };
        cumulative = cumulative
            .checked_add(config.steps_per_point + extra)
            .context("overflow computing cumulative steps")?;
        steps.push(StepSample::new(cumulative, timestamp));
    }

    let finished_at = match i64::try_from(positions.len()) {
        Ok(0) => started_at,
        Ok(count) => at_offset(count + 1)?,
        Err(_) => bail!("walk route too long"),
    };

    Ok(WalkPlan {
        positions,
        steps,
        started_at,
        finished_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use artwalkcore::catalog::Artwork;
    use artwalkcore::geo::DistanceEstimator;

    fn catalog() -> Catalog {
        let art = |id: u32, latitude: f64, longitude: f64| Artwork {
            id,
            name: format!("Piece {}", id),
            artist: "Anon".into(),
            description: String::new(),
            image: None,
            coords: Coordinates::new(latitude, longitude),
            trigger_distance: 0.0095,
            art_type: None,
            year: None,
        };
        Catalog::new(vec![art(1, 37.6922, -97.3456), art(2, 37.6941, -97.3412)]).unwrap()
    }

    #[test]
    fn plan_visits_every_artwork() {
        let catalog = catalog();
        let config = GeneratorConfig {
            seed: 3,
            ..Default::default()
        };
        let plan = build_walk_plan(&catalog, &config, Utc::now()).unwrap();

        for artwork in catalog.artworks() {
            let visited = plan.positions.iter().any(|sample| {
                DistanceEstimator::estimate(sample.coords, artwork.coords) <= artwork.trigger_distance
            });
            assert!(visited, "artwork {} never in range", artwork.id);
        }
    }

    #[test]
    fn step_feed_is_monotonic_and_one_ahead_of_positions() {
        let config = GeneratorConfig {
            start_steps: 1_000,
            ..Default::default()
        };
        let plan = build_walk_plan(&catalog(), &config, Utc::now()).unwrap();

        assert_eq!(plan.steps.len(), plan.positions.len() + 1);
        assert_eq!(plan.steps[0].cumulative_steps, 1_000);
        assert!(plan
            .steps
            .windows(2)
            .all(|pair| pair[0].cumulative_steps <= pair[1].cumulative_steps));
        assert!(plan.finished_at > plan.started_at);
    }

    #[test]
    fn empty_catalog_produces_idle_plan() {
        let plan = build_walk_plan(&Catalog::default(), &GeneratorConfig::default(), Utc::now())
            .unwrap();
        assert!(plan.positions.is_empty());
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.finished_at, plan.started_at);
    }

    #[test]
    fn non_finite_jitter_is_rejected() {
        for jitter_deg in [f64::NAN, f64::INFINITY, -0.001] {
            let config = GeneratorConfig {
                jitter_deg,
                ..Default::default()
            };
            let err = build_walk_plan(&catalog(), &config, Utc::now()).unwrap_err();
            assert!(err.to_string().contains("jitter_deg"), "{}", err);
        }
    }

    #[test]
    fn oversized_sample_interval_is_rejected() {
        let config = GeneratorConfig {
            sample_interval_secs: i64::MAX,
            ..Default::default()
        };
        let err = build_walk_plan(&catalog(), &config, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("sample_interval_secs"), "{}", err);
    }

    #[test]
    fn timestamps_past_calendar_range_are_errors() {
        let config = GeneratorConfig {
            sample_interval_secs: 86_400,
            ..Default::default()
        };
        assert!(build_walk_plan(&catalog(), &config, DateTime::<Utc>::MAX_UTC).is_err());
    }

    #[test]
    fn same_seed_replays_same_route() {
        let config = GeneratorConfig {
            seed: 11,
            ..Default::default()
        };
        let start = Utc::now();
        let a = build_walk_plan(&catalog(), &config, start).unwrap();
        let b = build_walk_plan(&catalog(), &config, start).unwrap();
        assert_eq!(a.positions, b.positions);
    }
}
