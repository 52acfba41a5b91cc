//! Writes synthetic 2015/2023 survey editions for manual testing:
//! `survey_2015.csv` and `survey_2023.csv` in the raw (pre-merge) shape,
//! including the warts the pipeline has to survive: missing cells,
//! free-text salaries, entry-error outliers, and mixed currencies.

use std::error::Error;

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

    fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[(self.next_u64() % options.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const WORK_FUNCTIONS: &[&str] = &[
    "Cost Estimating",
    "Project Controls",
    "Planning & Scheduling",
    "Claims",
    "Project Management",
];

const INDUSTRIES: &[&str] = &[
    "Oil & Gas",
    "Construction",
    "Power",
    "Infrastructure",
    "Mining",
    "Consulting",
];

const EDUCATION: &[&str] = &[
    "High School",
    "Bachelor's Degree",
    "Master's Degree",
    "Doctorate",
];

const CURRENCIES: &[&str] = &["USD", "USD", "USD", "USD", "EUR", "GBP", "CAD", "INR", "AUD"];

const TRAVEL: &[&str] = &["None", "Up to 25%", "25-50%", "Over 50%"];

const PROJECT_SIZES: &[&str] = &["< $1M", "$1M - $10M", "$10M - $100M", "> $100M"];

fn write_edition(
    path: &str,
    year: u16,
    n_rows: usize,
    rng: &mut SimpleRng,
) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut headers = vec![
        "Member",
        "EmploymentStatus",
        "WorkFunction",
        "Industry",
        "JobSatisfaction",
        "LevelOfEducation",
        "YearsOfExperience",
        "Age",
        "Sex",
        "AACECertified",
        "CurrentSalaryAmount",
        "CurrentSalaryCurrency",
        "SameEmployer",
        "WorkHours",
        "Travel",
        "ProjectSize",
    ];
    // The 2023 edition lists held certificates in a separate column.
    if year >= 2023 {
        headers.push("CertTypeCCP");
    }
    writer.write_record(&headers)?;

    for _ in 0..n_rows {
        let experience = (rng.next_u64() % 35) as f64 + rng.next_f64();
        let education = rng.pick(EDUCATION);
        let certified = rng.next_f64() < 0.35;
        let member = rng.next_f64() < 0.6;

        let education_bonus = match education {
            "Master's Degree" => 8_000.0,
            "Doctorate" => 14_000.0,
            _ => 0.0,
        };
        let mut salary = rng.gauss(
            48_000.0 + 3_000.0 * experience + education_bonus + if certified { 6_000.0 } else { 0.0 },
            9_000.0,
        );
        // A few entry errors: monthly figures typed with an extra digit.
        if rng.next_f64() < 0.02 {
            salary *= 8.0;
        }

        let experience_cell = if rng.next_f64() < 0.03 {
            String::new() // respondent skipped the question
        } else {
            format!("{experience:.1}")
        };
        let salary_cell = if rng.next_f64() < 0.01 {
            "prefer not to say".to_string()
        } else {
            format!("{salary:.0}")
        };

        let mut row = vec![
            if member { "Yes" } else { "No" }.to_string(),
            rng.pick(&["Full-time", "Full-time", "Full-time", "Part-time"])
                .to_string(),
            rng.pick(WORK_FUNCTIONS).to_string(),
            rng.pick(INDUSTRIES).to_string(),
            (1 + (rng.next_u64() % 5)).to_string(),
            education.to_string(),
            experience_cell,
            format!("{:.0}", 23.0 + experience + rng.gauss(0.0, 3.0)),
            rng.pick(&["M", "F"]).to_string(),
            if certified { "Yes" } else { "No" }.to_string(),
            salary_cell,
            rng.pick(CURRENCIES).to_string(),
            rng.pick(&["Yes", "No"]).to_string(),
            format!("{}", 35 + (rng.next_u64() % 26)),
            rng.pick(TRAVEL).to_string(),
            rng.pick(PROJECT_SIZES).to_string(),
        ];
        if year >= 2023 {
            row.push(if certified { "CCP".to_string() } else { String::new() });
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    println!("Wrote {n_rows} rows to {path}");
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut rng = SimpleRng::new(42);
    write_edition("survey_2015.csv", 2015, 420, &mut rng)?;
    write_edition("survey_2023.csv", 2023, 560, &mut rng)?;
    Ok(())
}
