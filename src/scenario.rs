use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    cell::Cell,
    grid::{cell_count, Grid, GridError},
    objects::{catalog, MapObject, ObjectError},
    resources::{ResourceRegistry, ResourceResolver},
    spatial::{GridPos, Layout},
};

fn default_cell_size() -> i32 {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

const DEFAULT_TURNS: u64 = 12;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub turns: Option<u64>,
    /// Edge length of one cell in screen units.
    #[serde(default = "default_cell_size")]
    pub cell_size: i32,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub extra_resources: Vec<String>,
    pub map: MapDefinition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapDefinition {
    pub size_x: i32,
    pub size_y: i32,
    /// Terrain for cells the file does not list. Without it every cell
    /// must be listed.
    #[serde(default)]
    pub default_terrain: Option<String>,
    #[serde(default)]
    pub cells: Vec<CellDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CellDefinition {
    pub x: i32,
    pub y: i32,
    pub terrain: String,
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
}

/// One initial resident. `kind` is the map tag; the remaining fields are
/// only read by the kinds that need them.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectSpec {
    pub kind: String,
    #[serde(default)]
    pub density: Option<u8>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
}

#[derive(Debug, Error)]
pub enum MapParseError {
    #[error("map size {size_x}x{size_y} is invalid")]
    InvalidSize { size_x: i32, size_y: i32 },
    #[error("cell {pos} lies outside the {size_x}x{size_y} map")]
    CellOutOfBounds {
        pos: GridPos,
        size_x: i32,
        size_y: i32,
    },
    #[error("cell {0} is defined more than once")]
    DuplicateCell(GridPos),
    #[error("cell {0} is not defined and the map has no default terrain")]
    MissingCell(GridPos),
    #[error("terrain '{terrain}' at {pos} has no 'terrain.{terrain}' resource")]
    UnresolvedTerrain { terrain: String, pos: GridPos },
    #[error("unknown object tag '{tag}' at {pos}")]
    UnknownObjectTag { tag: String, pos: GridPos },
    #[error("'{kind}' object at {pos} is missing '{field}'")]
    MissingField {
        kind: String,
        field: &'static str,
        pos: GridPos,
    },
    #[error(transparent)]
    Object(#[from] ObjectError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        ensure!(
            scenario.cell_size > 0,
            "cell_size must be positive in {}",
            path.display()
        );
        Ok(scenario)
    }
}

impl Scenario {
    /// Default resources plus whatever the scenario adds.
    pub fn resources(&self) -> ResourceRegistry {
        let mut registry = ResourceRegistry::with_defaults();
        for name in &self.extra_resources {
            registry.register(name);
        }
        registry
    }

    pub fn layout(&self) -> Layout {
        Layout::new(self.cell_size)
    }

    pub fn turns(&self, override_turns: Option<u64>) -> u64 {
        override_turns.or(self.turns).unwrap_or(DEFAULT_TURNS)
    }

    /// Builds the whole map or nothing.
    pub fn build_grid(&self, resolver: &dyn ResourceResolver) -> Result<Grid, MapParseError> {
        let MapDefinition {
            size_x,
            size_y,
            ref default_terrain,
            ref cells,
        } = self.map;
        let count = cell_count(size_x, size_y)
            .map_err(|_| MapParseError::InvalidSize { size_x, size_y })?;

        let mut defined: BTreeMap<GridPos, &CellDefinition> = BTreeMap::new();
        for definition in cells {
            let pos = GridPos::new(definition.x, definition.y);
            if !(0..size_x).contains(&pos.x) || !(0..size_y).contains(&pos.y) {
                return Err(MapParseError::CellOutOfBounds {
                    pos,
                    size_x,
                    size_y,
                });
            }
            if defined.insert(pos, definition).is_some() {
                return Err(MapParseError::DuplicateCell(pos));
            }
        }

        let mut built = Vec::with_capacity(count);
        for y in 0..size_y {
            for x in 0..size_x {
                let pos = GridPos::new(x, y);
                let (terrain, specs) = match (defined.get(&pos), default_terrain) {
                    (Some(definition), _) => {
                        (definition.terrain.as_str(), definition.objects.as_slice())
                    }
                    (None, Some(terrain)) => (terrain.as_str(), <&[ObjectSpec]>::default()),
                    (None, None) => return Err(MapParseError::MissingCell(pos)),
                };
                let sprite = resolver
                    .resolve(&format!("terrain.{terrain}"))
                    .ok_or_else(|| MapParseError::UnresolvedTerrain {
                        terrain: terrain.to_string(),
                        pos,
                    })?;
                let mut cell = Cell::new(pos, terrain, sprite);
                for spec in specs {
                    cell.add_object(build_object(spec, pos, resolver)?);
                }
                built.push(cell);
            }
        }

        let grid = Grid::from_cells(size_x, size_y, built)?;
        tracing::debug!(scenario = %self.name, size_x, size_y, "map built");
        Ok(grid)
    }
}

fn build_object(
    spec: &ObjectSpec,
    pos: GridPos,
    resolver: &dyn ResourceResolver,
) -> Result<MapObject, MapParseError> {
    let missing = |field| MapParseError::MissingField {
        kind: spec.kind.clone(),
        field,
        pos,
    };
    let object = match spec.kind.as_str() {
        "tribe" => catalog::tribe(resolver)?,
        "boulders" => catalog::boulders(resolver)?,
        "forest" => catalog::forest(
            spec.density.unwrap_or(0),
            spec.age.unwrap_or(0),
            resolver,
        )?,
        "scenery" => {
            let name = spec.name.as_deref().ok_or_else(|| missing("name"))?;
            let resource = spec.resource.as_deref().ok_or_else(|| missing("resource"))?;
            MapObject::scenery(name, resource, resolver)?
        }
        other => {
            return Err(MapParseError::UnknownObjectTag {
                tag: other.to_string(),
                pos,
            })
        }
    };
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ObjectKind;

    fn parse(yaml: &str) -> Scenario {
        serde_yaml::from_str(yaml).expect("scenario yaml")
    }

    const TWO_BY_ONE: &str = r#"
name: strip
seed: 1
map:
  size_x: 2
  size_y: 1
  cells:
    - { x: 0, y: 0, terrain: plains, objects: [ { kind: tribe } ] }
    - x: 1
      y: 0
      terrain: hills
      objects:
        - { kind: forest, density: 60, age: 12 }
        - { kind: boulders }
"#;

    #[test]
    fn defaults_apply() {
        let scenario = parse(TWO_BY_ONE);
        assert_eq!(scenario.cell_size, 50);
        assert_eq!(scenario.logging.level, "info");
        assert_eq!(scenario.turns(None), DEFAULT_TURNS);
        assert_eq!(scenario.turns(Some(3)), 3);
    }

    #[test]
    fn builds_cells_in_order_with_residents() {
        let scenario = parse(TWO_BY_ONE);
        let grid = scenario.build_grid(&scenario.resources()).unwrap();
        assert_eq!(grid.size(), (2, 1));

        let plains = grid.get_cell(GridPos::new(0, 0)).unwrap();
        assert_eq!(plains.terrain(), "plains");
        assert_eq!(plains.objects()[0].kind(), ObjectKind::Unit);

        let hills = grid.get_cell(GridPos::new(1, 0)).unwrap();
        assert_eq!(hills.objects().len(), 2);
        assert_eq!(hills.stats().movement_cost(), 1 + 2 + 1);
        let forest = hills.objects()[0].growth().unwrap();
        assert_eq!((forest.density(), forest.age()), (60, 12));

        let ids: Vec<u64> = grid
            .cells()
            .flat_map(|cell| cell.objects().iter().map(|object| object.id().raw()))
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn unknown_tag_is_fatal() {
        let scenario = parse(
            r#"
name: bad
seed: 1
map:
  size_x: 1
  size_y: 1
  cells:
    - { x: 0, y: 0, terrain: plains, objects: [ { kind: dragon } ] }
"#,
        );
        let err = scenario.build_grid(&scenario.resources()).unwrap_err();
        assert!(matches!(err, MapParseError::UnknownObjectTag { ref tag, .. } if tag == "dragon"));
    }

    #[test]
    fn missing_cell_without_default_terrain() {
        let scenario = parse(
            r#"
name: holes
seed: 1
map:
  size_x: 2
  size_y: 2
  cells:
    - { x: 0, y: 0, terrain: plains }
"#,
        );
        let err = scenario.build_grid(&scenario.resources()).unwrap_err();
        assert!(matches!(err, MapParseError::MissingCell(pos) if pos == GridPos::new(1, 0)));
    }

    #[test]
    fn default_terrain_fills_unlisted_cells() {
        let scenario = parse(
            r#"
name: filled
seed: 1
map:
  size_x: 3
  size_y: 2
  default_terrain: grass
  cells:
    - { x: 2, y: 1, terrain: swamp }
"#,
        );
        let grid = scenario.build_grid(&scenario.resources()).unwrap();
        assert_eq!(grid.get_cell(GridPos::new(0, 0)).unwrap().terrain(), "grass");
        assert_eq!(grid.get_cell(GridPos::new(2, 1)).unwrap().terrain(), "swamp");
    }

    #[test]
    fn duplicate_and_out_of_bounds_cells() {
        let duplicate = parse(
            r#"
name: dup
seed: 1
map:
  size_x: 1
  size_y: 1
  cells:
    - { x: 0, y: 0, terrain: plains }
    - { x: 0, y: 0, terrain: hills }
"#,
        );
        assert!(matches!(
            duplicate.build_grid(&duplicate.resources()),
            Err(MapParseError::DuplicateCell(_))
        ));

        let outside = parse(
            r#"
name: outside
seed: 1
map:
  size_x: 1
  size_y: 1
  cells:
    - { x: 0, y: 0, terrain: plains }
    - { x: 0, y: 4, terrain: plains }
"#,
        );
        assert!(matches!(
            outside.build_grid(&outside.resources()),
            Err(MapParseError::CellOutOfBounds { .. })
        ));
    }

    #[test]
    fn unknown_terrain_and_extra_resources() {
        let yaml = r#"
name: desert
seed: 1
map:
  size_x: 1
  size_y: 1
  default_terrain: desert
"#;
        let scenario = parse(yaml);
        assert!(matches!(
            scenario.build_grid(&scenario.resources()),
            Err(MapParseError::UnresolvedTerrain { .. })
        ));

        let mut scenario = parse(yaml);
        scenario.extra_resources.push("terrain.desert".to_string());
        assert!(scenario.build_grid(&scenario.resources()).is_ok());
    }

    #[test]
    fn scenery_needs_name_and_resource() {
        let scenario = parse(
            r#"
name: scenery
seed: 1
extra_resources: [ object.ruins ]
map:
  size_x: 2
  size_y: 1
  cells:
    - { x: 0, y: 0, terrain: plains, objects: [ { kind: scenery, name: Ruins, resource: object.ruins } ] }
    - { x: 1, y: 0, terrain: plains, objects: [ { kind: scenery, resource: object.ruins } ] }
"#,
        );
        let err = scenario.build_grid(&scenario.resources()).unwrap_err();
        assert!(matches!(err, MapParseError::MissingField { field: "name", .. }));
    }

    #[test]
    fn invalid_forest_density_is_an_object_error() {
        let scenario = parse(
            r#"
name: dense
seed: 1
map:
  size_x: 1
  size_y: 1
  cells:
    - { x: 0, y: 0, terrain: plains, objects: [ { kind: forest, density: 120 } ] }
"#,
        );
        assert!(matches!(
            scenario.build_grid(&scenario.resources()),
            Err(MapParseError::Object(ObjectError::InvalidDensity(120)))
        ));
    }

    #[test]
    fn overflowing_map_size_is_rejected() {
        let scenario = parse(
            r#"
name: huge
seed: 1
map: { size_x: 70000, size_y: 70000, default_terrain: plains }
"#,
        );
        assert!(matches!(
            scenario.build_grid(&scenario.resources()),
            Err(MapParseError::InvalidSize {
                size_x: 70000,
                size_y: 70000
            })
        ));
    }

    #[test]
    fn zero_sized_map_is_rejected() {
        let scenario = parse(
            r#"
name: empty
seed: 1
map: { size_x: 0, size_y: 3 }
"#,
        );
        assert!(matches!(
            scenario.build_grid(&scenario.resources()),
            Err(MapParseError::InvalidSize { .. })
        ));
    }
}
