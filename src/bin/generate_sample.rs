//! Generate a synthetic gemstone CSV for trying out the explorer:
//! `cargo run --bin generate_sample` writes `sample_gemstones.csv`.

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

const CUTS: [&str; 5] = ["Fair", "Good", "Very Good", "Premium", "Ideal"];
const COLORS: [&str; 7] = ["J", "I", "H", "G", "F", "E", "D"];
const CLARITIES: [&str; 8] = ["I1", "SI2", "SI1", "VS2", "VS1", "VVS2", "VVS1", "IF"];

fn main() {
    let mut rng = SimpleRng::new(42);
    let path = "sample_gemstones.csv";
    let mut writer = csv::Writer::from_path(path).expect("creating sample file");

    writer
        .write_record(["carat", "cut", "color", "clarity", "depth", "table", "price", "x", "y", "z"])
        .expect("writing header");

    let n = 2000;
    for i in 0..n {
        let carat = (0.2 + rng.next_f64().powi(2) * 3.0).min(5.0);
        let cut_i = (rng.next_u64() % CUTS.len() as u64) as usize;
        let color_i = (rng.next_u64() % COLORS.len() as u64) as usize;
        let clarity_i = (rng.next_u64() % CLARITIES.len() as u64) as usize;

        // Price rises superlinearly with carat and mildly with the grades.
        let base = 2800.0 * carat.powf(1.8);
        let grade_factor = 1.0 + 0.05 * (cut_i + color_i + clarity_i) as f64;
        let price = (base * grade_factor * (1.0 + rng.gauss(0.0, 0.12))).max(320.0);

        let depth = rng.gauss(61.8, 1.3);
        let table = rng.gauss(57.3, 2.0);

        // Physical dimensions track carat weight.
        let side = (carat * 2.2).cbrt() * 4.0;
        let (mut x, mut y, mut z) = (
            side * (1.0 + rng.gauss(0.0, 0.01)),
            side * (1.0 + rng.gauss(0.0, 0.01)),
            side * 0.62 * (1.0 + rng.gauss(0.0, 0.015)),
        );

        // A handful of bad measurements, dropped by the explorer at load.
        if i % 250 == 0 {
            match i / 250 % 3 {
                0 => x = 0.0,
                1 => y = 0.0,
                _ => z = 0.0,
            }
        }

        writer
            .write_record([
                format!("{carat:.2}"),
                CUTS[cut_i].to_string(),
                COLORS[color_i].to_string(),
                CLARITIES[clarity_i].to_string(),
                format!("{depth:.1}"),
                format!("{table:.1}"),
                format!("{price:.0}"),
                format!("{x:.2}"),
                format!("{y:.2}"),
                format!("{z:.2}"),
            ])
            .expect("writing row");
    }

    writer.flush().expect("flushing sample file");
    println!("Wrote {n} rows to {path}");
}
