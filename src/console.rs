//! Colorful console output for optimization runs.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::time::{Duration, Instant};

use crate::progress::ProgressListener;
use crate::solver::{Solution, Termination};

/// ASCII art banner for server startup.
pub fn print_banner() {
    let banner = r#"
  ____  _     _  __ _     ____       _              _       _
 / ___|| |__ (_)/ _| |_  / ___|  ___| |__   ___  __| |_   _| | ___
 \___ \| '_ \| | |_| __| \___ \ / __| '_ \ / _ \/ _` | | | | |/ _ \
  ___) | | | | |  _| |_   ___) | (__| | | |  __/ (_| | |_| | |  __/
 |____/|_| |_|_|_|  \__| |____/ \___|_| |_|\___|\__,_|\__,_|_|\___|
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "Genetic Shift Scheduling".bright_cyan()
    );
}

/// Prints the problem size at the start of a run.
pub fn print_run_started(slots: usize, employees: usize, population_size: usize) {
    println!(
        "{} {} {} Problem: slots ({}), employees ({}), population ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Optimizer]".bright_cyan(),
        slots.to_formatted_string(&Locale::en).bright_yellow(),
        employees.to_formatted_string(&Locale::en).bright_yellow(),
        population_size.to_formatted_string(&Locale::en).bright_yellow()
    );
}

/// Prints one progress line.
pub fn print_generation(generation: usize, elapsed: Duration, fitness: f64) {
    let generations_per_sec = if elapsed.as_secs_f64() > 0.0 {
        ((generation + 1) as f64 / elapsed.as_secs_f64()) as u64
    } else {
        0
    };

    println!(
        "{} {} {} generation ({}), time spent ({}), best fitness ({}), speed ({}/sec)",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Optimizer]".bright_cyan(),
        generation.to_formatted_string(&Locale::en).white(),
        format_duration(elapsed).yellow(),
        format_fitness(fitness),
        generations_per_sec
            .to_formatted_string(&Locale::en)
            .bright_magenta()
            .bold()
    );
}

/// Prints the final summary box.
pub fn print_run_ended(total_duration: Duration, solution: &Solution) {
    println!();
    println!("{}", "╔══════════════════════════════════════════════════════════╗".bright_cyan());

    let status_text = match solution.termination {
        Termination::Converged => "✓ FEASIBLE SCHEDULE FOUND",
        Termination::Exhausted => "✗ GENERATION LIMIT REACHED",
        Termination::Cancelled => "■ RUN REVOKED",
    };
    let status_colored = match solution.termination {
        Termination::Converged => status_text.bright_green().bold().to_string(),
        Termination::Exhausted => status_text.bright_red().bold().to_string(),
        Termination::Cancelled => status_text.yellow().bold().to_string(),
    };
    let status_padding = 56 - status_text.chars().count();
    let left_pad = status_padding / 2;
    let right_pad = status_padding - left_pad;
    println!(
        "{}{}{}{}{}",
        "║".bright_cyan(),
        " ".repeat(left_pad),
        status_colored,
        " ".repeat(right_pad),
        "║".bright_cyan()
    );

    println!("{}", "╠══════════════════════════════════════════════════════════╣".bright_cyan());

    let rows = [
        ("Best Fitness:", format!("{:.6}", solution.best.fitness())),
        ("Violations:", format!("{:.2}", solution.best.violations())),
        ("Generations:", solution.generations.to_formatted_string(&Locale::en)),
        ("Solving Time:", format!("{:.2}s", total_duration.as_secs_f64())),
    ];
    for (label, value) in rows {
        println!(
            "{}  {:<18}{:>36}  {}",
            "║".bright_cyan(),
            label,
            value,
            "║".bright_cyan()
        );
    }

    println!("{}", "╚══════════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}

/// Formats a duration nicely.
fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        let mins = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

/// Green when feasible, yellow otherwise.
fn format_fitness(fitness: f64) -> String {
    let text = format!("{:.6}", fitness);
    if fitness >= 1.0 {
        text.bright_green().to_string()
    } else {
        text.yellow().to_string()
    }
}

/// Returns a timestamp string.
fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs();
            let millis = d.subsec_millis();
            format!("{}.{:03}", secs, millis)
        })
        .unwrap_or_else(|_| "0.000".to_string())
}

/// Prints each reported generation to the console.
pub struct ConsoleListener {
    start: Instant,
}

impl ConsoleListener {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for ConsoleListener {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressListener for ConsoleListener {
    fn on_generation_update(&mut self, generation: usize, fitness: f64) {
        if cfg!(feature = "console") {
            print_generation(generation, self.start.elapsed(), fitness);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }
}
