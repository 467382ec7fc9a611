use crate::core::aggregation::SmallAreaDemand;
use crate::core::benchmark_matcher::UseMapping;
use crate::core::benchmarks::WeatherAdjustedBenchmark;
use crate::core::demand::{BuildingDemand, DemandField};
use crate::core::floor_area::BoundedAreaRow;
use crate::core::spatial_linker::LinkedBuilding;
use crate::output::Output;
use crate::read_benchmark_uses::write_benchmark_uses_json;
use csv::WriterBuilder;
use itertools::Itertools;
use std::io::Write;
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument};

pub(crate) const BUILDINGS_KEY: &str = "buildings";
pub(crate) const NORMALISED_BENCHMARKS_KEY: &str = "normalised_benchmarks";
pub(crate) const BENCHMARK_USES_KEY: &str = "benchmark_uses";
pub(crate) const UNKNOWN_BENCHMARK_USES_KEY: &str = "unknown_benchmark_uses";
pub(crate) const BOUNDED_AREAS_KEY: &str = "bounded_areas";
pub(crate) const SMALL_AREA_DEMANDS_KEY: &str = "small_area_demands";

const ATTRIBUTE_HEADINGS: [&str; 8] = [
    "PropertyNo",
    "Category",
    "Use1",
    "Use2",
    "List_Status",
    "Benchmark",
    "Total_SQM",
    "bounded_area_m2",
];
const BOUNDARY_HEADINGS: [&str; 5] = ["X_ITM", "Y_ITM", "small_area", "countyname", "local_authority"];

/// Which demand columns of the building table are written, and optionally a demand a building must
/// have a positive value of to be written at all.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildingColumns {
    pub demand_fields: Vec<DemandField>,
    pub filter_on: Option<DemandField>,
}

impl Default for BuildingColumns {
    fn default() -> Self {
        Self {
            demand_fields: DemandField::iter().collect(),
            filter_on: None,
        }
    }
}

impl BuildingColumns {
    fn includes(&self, building: &LinkedBuilding) -> bool {
        self.filter_on
            .map_or(true, |field| building.demand.demand.get(field) > 0.)
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

#[instrument(skip_all)]
pub(crate) fn write_buildings(
    output: &impl Output,
    buildings: &[LinkedBuilding],
    columns: &BuildingColumns,
) -> anyhow::Result<()> {
    debug!(
        "Writing demand columns {}",
        columns.demand_fields.iter().join(", ")
    );
    let writer = output.writer_for_location_key(BUILDINGS_KEY, "csv")?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    let mut headings: Vec<&str> = ATTRIBUTE_HEADINGS.to_vec();
    headings.extend(columns.demand_fields.iter().map(|field| field.as_ref()));
    headings.extend(BOUNDARY_HEADINGS);
    writer.write_record(&headings)?;

    let mut written = 0usize;
    for building in buildings.iter().filter(|building| columns.includes(building)) {
        let raw = &building.demand.bounded.matched.building;
        let boundary = building.boundary.as_ref();

        let mut row: Vec<String> = vec![
            raw.property_no.clone(),
            optional(raw.category.as_deref()),
            optional(raw.use1.as_deref()),
            optional(raw.use2.as_deref()),
            optional(raw.list_status.as_deref()),
            building.demand.benchmark().to_string(),
            optional(raw.total_sqm),
            optional(building.demand.bounded.bounded_area_m2),
        ];
        row.extend(
            columns
                .demand_fields
                .iter()
                .map(|field| building.demand.demand.get(*field).to_string()),
        );
        row.append(&mut vec![
            optional(raw.x_itm),
            optional(raw.y_itm),
            optional(boundary.map(|names| names.small_area.as_str())),
            optional(boundary.and_then(|names| names.county_name.as_deref())),
            optional(boundary.and_then(|names| names.local_authority.as_deref())),
        ]);

        writer.write_record(&row)?;
        written += 1;
    }

    info!("Wrote {written} of {} buildings", buildings.len());
    writer.flush()?;

    Ok(())
}

pub(crate) fn write_normalised_benchmarks(
    output: &impl Output,
    benchmarks: &[WeatherAdjustedBenchmark],
) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key(NORMALISED_BENCHMARKS_KEY, "csv")?;
    let mut writer = WriterBuilder::new().from_writer(writer);
    for benchmark in benchmarks {
        writer.serialize(benchmark)?;
    }
    writer.flush()?;

    Ok(())
}

pub(crate) fn write_benchmark_uses(output: &impl Output, uses: &UseMapping) -> anyhow::Result<()> {
    let mut writer = output.writer_for_location_key(BENCHMARK_USES_KEY, "json")?;
    write_benchmark_uses_json(uses, &mut writer)?;
    writer.flush()?;

    Ok(())
}

pub(crate) fn write_unknown_benchmark_uses(
    output: &impl Output,
    unknown_uses: &[String],
) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key(UNKNOWN_BENCHMARK_USES_KEY, "csv")?;
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(["Use1"])?;
    for building_use in unknown_uses {
        writer.write_record([building_use])?;
    }
    writer.flush()?;

    Ok(())
}

pub(crate) fn write_bounded_areas(
    output: &impl Output,
    buildings: &[BuildingDemand],
) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key(BOUNDED_AREAS_KEY, "csv")?;
    let mut writer = WriterBuilder::new().from_writer(writer);
    for building in buildings {
        writer.serialize(BoundedAreaRow::from(&building.bounded))?;
    }
    writer.flush()?;

    Ok(())
}

pub(crate) fn write_small_area_demands(
    output: &impl Output,
    small_areas: &[SmallAreaDemand],
) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key(SMALL_AREA_DEMANDS_KEY, "csv")?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    let mut headings: Vec<&str> = vec![
        "small_area",
        "countyname",
        "local_authority",
        "number_of_buildings",
        "bounded_area_m2",
    ];
    headings.extend(DemandField::iter().map(<&'static str>::from));
    headings.extend(["polygon_area_km2", "heat_demand_tj_per_km2y"]);
    writer.write_record(&headings)?;

    for small_area in small_areas {
        let mut row: Vec<String> = vec![
            small_area.small_area.clone(),
            optional(small_area.county_name.as_deref()),
            optional(small_area.local_authority.as_deref()),
            small_area.number_of_buildings.to_string(),
            small_area.bounded_area_m2.to_string(),
        ];
        row.extend(
            DemandField::iter().map(|field| small_area.demand_mwh_per_y[&field].to_string()),
        );
        row.push(small_area.polygon_area_km2.to_string());
        row.push(optional(small_area.heat_demand_tj_per_km2y()));

        writer.write_record(&row)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spatial_linker::tests::building_at;
    use crate::core::spatial_linker::BoundaryNames;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Keeps everything written to it in memory, by location key.
    #[derive(Debug, Default)]
    struct MemoryOutput {
        files: Arc<Mutex<IndexMap<String, Arc<Mutex<Vec<u8>>>>>>,
    }

    struct MemoryWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for MemoryWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Output for MemoryOutput {
        fn writer_for_location_key(
            &self,
            location_key: &str,
            file_extension: &str,
        ) -> anyhow::Result<impl Write> {
            let contents = Arc::new(Mutex::new(vec![]));
            self.files.lock().unwrap().insert(
                format!("{location_key}.{file_extension}"),
                contents.clone(),
            );
            Ok(MemoryWriter(contents))
        }
    }

    impl MemoryOutput {
        fn contents(&self, file_name: &str) -> String {
            let files = self.files.lock().unwrap();
            let contents = String::from_utf8(files[file_name].lock().unwrap().clone()).unwrap();
            contents
        }
    }

    #[fixture]
    fn buildings() -> Vec<LinkedBuilding> {
        let mut heated = building_at("1", Some((5., 5.)));
        heated.bounded.matched.building.use1 = Some("OFFICE".to_string());
        heated.bounded.matched.benchmark = "General office".to_string();
        heated.bounded.bounded_area_m2 = Some(200.);
        heated.demand.fossil_fuel_heat = 20.;

        let unheated = building_at("2", None);

        vec![
            LinkedBuilding {
                demand: heated,
                boundary: Some(BoundaryNames {
                    small_area: "A".to_string(),
                    county_name: Some("DUBLIN".to_string()),
                    local_authority: None,
                }),
            },
            LinkedBuilding {
                demand: unheated,
                boundary: None,
            },
        ]
    }

    #[rstest]
    fn should_write_selected_demand_columns_between_attributes_and_boundaries(
        buildings: Vec<LinkedBuilding>,
    ) {
        let output = MemoryOutput::default();
        let columns = BuildingColumns {
            demand_fields: vec![DemandField::Heat],
            filter_on: None,
        };

        write_buildings(&output, &buildings, &columns).unwrap();

        assert_eq!(
            output.contents("buildings.csv"),
            "PropertyNo,Category,Use1,Use2,List_Status,Benchmark,Total_SQM,bounded_area_m2,\
             heat_demand_mwh_per_y,X_ITM,Y_ITM,small_area,countyname,local_authority\n\
             1,,OFFICE,,,General office,,200,20,5,5,A,DUBLIN,\n\
             2,,,,,Unknown,,,0,,,,,\n"
        );
    }

    #[rstest]
    fn should_only_write_buildings_with_positive_filtered_demand(buildings: Vec<LinkedBuilding>) {
        let output = MemoryOutput::default();
        let columns = BuildingColumns {
            filter_on: Some(DemandField::FossilFuelHeat),
            ..Default::default()
        };

        write_buildings(&output, &buildings, &columns).unwrap();

        let contents = output.contents("buildings.csv");
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().nth(1).unwrap().starts_with("1,"));
    }

    #[rstest]
    fn should_write_unknown_uses_under_use_heading() {
        let output = MemoryOutput::default();

        write_unknown_benchmark_uses(
            &output,
            &["LIGHTHOUSE".to_string(), "BANDSTAND".to_string()],
        )
        .unwrap();

        assert_eq!(
            output.contents("unknown_benchmark_uses.csv"),
            "Use1\nLIGHTHOUSE\nBANDSTAND\n"
        );
    }

    #[rstest]
    fn should_write_normalised_benchmarks_with_benchmark_heading() {
        let output = MemoryOutput::default();

        write_normalised_benchmarks(
            &output,
            &[WeatherAdjustedBenchmark {
                name: "General office".to_string(),
                ..Default::default()
            }],
        )
        .unwrap();

        assert!(output
            .contents("normalised_benchmarks.csv")
            .starts_with("Benchmark,"));
    }

    #[rstest]
    fn should_write_small_area_totals_with_density() {
        let output = MemoryOutput::default();
        let mut demand_mwh_per_y: IndexMap<DemandField, f64> =
            DemandField::iter().map(|field| (field, 0.)).collect();
        demand_mwh_per_y.insert(DemandField::Heat, 1_000.);

        write_small_area_demands(
            &output,
            &[SmallAreaDemand {
                small_area: "A".to_string(),
                county_name: None,
                local_authority: Some("Fingal".to_string()),
                number_of_buildings: 3,
                bounded_area_m2: 600.,
                demand_mwh_per_y,
                polygon_area_km2: 2.,
            }],
        )
        .unwrap();

        let contents = output.contents("small_area_demands.csv");
        let mut lines = contents.lines();
        assert!(lines
            .next()
            .unwrap()
            .ends_with("heat_demand_mwh_per_y,polygon_area_km2,heat_demand_tj_per_km2y"));
        assert!(lines.next().unwrap().ends_with(",1000,2,1.8"));
    }
}
