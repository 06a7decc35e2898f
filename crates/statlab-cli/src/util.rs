use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use statlab_data::tree::TreeFile;
use statlab_stats::{fit::FitResult, histogram::Histogram};

const BAR_WIDTH: usize = 50;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)?;
        if let Output::File { path, .. } = &output {
            log::info!("report written to {}", path.display());
        }
        Ok(())
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn open_tree_file(path: &Path) -> anyhow::Result<TreeFile> {
    TreeFile::open(path).with_context(|| format!("Failed to read tree file: {}", path.display()))
}

pub fn print_title(title: &str) {
    println!("{title}");
    println!("{}", "=".repeat(title.chars().count()));
}

/// Histogram as text bars with its entry count and statistics.
pub fn print_histogram(title: &str, histogram: &Histogram) {
    println!();
    println!(
        "{title} ({} bins on [{}, {}), entries {}, mean {:.4}, std dev {:.4})",
        histogram.num_bins(),
        histogram.low(),
        histogram.high(),
        histogram.entries(),
        histogram.mean(),
        histogram.std_dev()
    );
    print!("{}", histogram.render_bars(BAR_WIDTH));
    if histogram.underflow() != 0.0 || histogram.overflow() != 0.0 {
        println!(
            "  underflow {}, overflow {}",
            histogram.underflow(),
            histogram.overflow()
        );
    }
}

/// Parameter table followed by the goodness-of-fit line.
pub fn print_fit(names: &[&str], fit: &FitResult) {
    for (name, (value, error)) in names.iter().zip(fit.params.iter().zip(&fit.errors)) {
        println!("  {name:<10} {value:>14.6} ± {error:<12.6}");
    }
    println!(
        "  chi2 / ndf = {:.4} / {} = {:.4}, P(chi2) = {:.4}{}",
        fit.chi_square,
        fit.ndf,
        fit.reduced_chi_square(),
        fit.probability(),
        if fit.converged { "" } else { " (not converged)" }
    );
}
