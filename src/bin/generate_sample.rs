use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use gapminder_panda::data::model::Observation;

/// (continent, countries, base GDP per capita, base life expectancy, base HDI)
const REGIONS: [(&str, &[&str], f64, f64, f64); 6] = [
    ("Asia", &["Japan", "India", "Vietnam", "Qatar"], 9000.0, 68.0, 0.65),
    ("Africa", &["Kenya", "Chad", "Ghana", "Egypt"], 2000.0, 56.0, 0.45),
    ("Europe", &["France", "Poland", "Norway", "Spain"], 30000.0, 77.0, 0.85),
    ("North America", &["Canada", "Mexico", "Cuba"], 25000.0, 75.0, 0.78),
    ("Oceania", &["Australia", "Fiji", "Samoa"], 20000.0, 72.0, 0.74),
    ("South America", &["Brazil", "Peru", "Chile", "Bolivia"], 8000.0, 70.0, 0.70),
];

const FIRST_YEAR: i64 = 1998;
const LAST_YEAR: i64 = 2018;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[lo, hi)`.
    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

fn generate(rng: &mut SimpleRng) -> Vec<Observation> {
    let mut rows = Vec::new();
    for year in FIRST_YEAR..=LAST_YEAR {
        let t = (year - FIRST_YEAR) as f64;
        for &(continent, countries, base_gdp, base_life_exp, base_hdi) in &REGIONS {
            for country in countries {
                let scale = rng.range(0.4, 1.8);
                let gdp = (base_gdp * scale * (1.0 + 0.02 * t)).round();
                let hdi = (base_hdi * rng.range(0.85, 1.1) + 0.004 * t).min(0.99);
                let life_exp = base_life_exp + 0.2 * t + rng.range(-4.0, 4.0);
                rows.push(Observation {
                    country: country.to_string(),
                    continent: continent.to_string(),
                    year,
                    life_exp: life_exp.clamp(30.0, 90.0),
                    hdi_index: (!rng.chance(0.05)).then_some((hdi * 1000.0).round() / 1000.0),
                    co2_consump: (!rng.chance(0.03))
                        .then_some(gdp / 4000.0 * rng.range(0.5, 1.5)),
                    gdp,
                    services: Some(rng.range(20.0, 80.0)),
                });
            }
        }
    }
    rows
}

fn write_csv(path: &Path, rows: &[Observation]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Observation]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("country", DataType::Utf8, false),
        Field::new("continent", DataType::Utf8, false),
        Field::new("year", DataType::Int64, false),
        Field::new("life_exp", DataType::Float64, false),
        Field::new("hdi_index", DataType::Float64, true),
        Field::new("co2_consump", DataType::Float64, true),
        Field::new("gdp", DataType::Float64, false),
        Field::new("services", DataType::Float64, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|o| o.country.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|o| o.continent.as_str()))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|o| o.year))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|o| o.life_exp))),
        Arc::new(rows.iter().map(|o| o.hdi_index).collect::<Float64Array>()),
        Arc::new(rows.iter().map(|o| o.co2_consump).collect::<Float64Array>()),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|o| o.gdp))),
        Arc::new(rows.iter().map(|o| o.services).collect::<Float64Array>()),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let output_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data.csv"));

    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    let ext = output_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => write_csv(&output_path, &rows)?,
        "parquet" | "pq" => write_parquet(&output_path, &rows)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    log::info!("Wrote {} observations to {}", rows.len(), output_path.display());
    println!(
        "Wrote {} observations ({FIRST_YEAR}-{LAST_YEAR}) to {}",
        rows.len(),
        output_path.display()
    );
    Ok(())
}
