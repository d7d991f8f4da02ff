use anyhow::{Context, Result};
use serde::Serialize;

/// One output row, headers matching the dashboard's expected columns.
#[derive(Serialize)]
struct Row<'a> {
    #[serde(rename = "Employee Name")]
    employee_name: String,
    #[serde(rename = "Store")]
    store: &'a str,
    #[serde(rename = "Entity Id")]
    entity_id: &'a str,
    #[serde(rename = "Country")]
    country: &'a str,
    #[serde(rename = "Audit Status")]
    audit_status: &'a str,
    #[serde(rename = "Result")]
    result: String,
}

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn status_for(score: f64) -> &'static str {
    match score {
        s if s < 50.0 => "Below Expectation",
        s if s < 65.0 => "Needs Improvement",
        s if s < 85.0 => "Meets Expectation",
        _ => "Outstanding",
    }
}

const FIRST_NAMES: [&str; 8] = ["Amira", "Bruno", "Chloé", "Dev", "Elena", "Farid", "Grace", "Hugo"];
const LAST_NAMES: [&str; 6] = ["Martin", "Haddad", "Smith", "Dubois", "Khan", "Rossi"];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // (country, store, entity id, mean score, spread, headcount)
    let stores: [(&str, &str, &str, f64, f64, usize); 6] = [
        ("France", "Paris Champs-Elysees", "FR-001", 78.0, 9.0, 40),
        ("France", "Paris Opera", "FR-002", 71.0, 12.0, 35),
        ("France", "Lyon Bellecour", "FR-003", 64.0, 14.0, 25),
        ("UAE", "Dubai Mall", "AE-001", 74.0, 10.0, 45),
        ("UAE", "Abu Dhabi Galleria", "AE-002", 69.0, 11.0, 30),
        ("UK", "London Harrods", "UK-001", 81.0, 7.0, 30),
    ];

    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_audit.csv".to_string());
    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;

    let mut rows = 0usize;
    for (country, store, entity_id, mean, spread, headcount) in stores {
        for _ in 0..headcount {
            let first = FIRST_NAMES[(rng.next_u64() % FIRST_NAMES.len() as u64) as usize];
            let last = LAST_NAMES[(rng.next_u64() % LAST_NAMES.len() as u64) as usize];
            let score = rng.gauss(mean, spread).clamp(0.0, 100.0).round();

            // Roughly one audit in twenty-five was never scored.
            let result = if rng.next_f64() < 0.04 {
                "N/A".to_string()
            } else {
                format!("{score}")
            };

            writer.serialize(Row {
                employee_name: format!("{first} {last}"),
                store,
                entity_id,
                country,
                audit_status: status_for(score),
                result,
            })?;
            rows += 1;
        }
    }
    writer.flush().context("flushing CSV")?;

    println!("Wrote {rows} audit results to {output_path}");
    Ok(())
}
