use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use hop_core::errors::{ErrorInfo, HopError};
use tracing::{debug, info};

use crate::simulation::{DistanceLog, Simulation};

/// The four text files a simulation checkpoint consists of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
    /// Transition histogram rows `energy t[-k] .. t[+k]`.
    Transitions,
    /// Adaptive weight rows `energy ln_weight`.
    Weights,
    /// Energy histogram rows `energy count [samples]`.
    Energies,
    /// Pattern distance accumulators.
    Distances,
}

impl CheckpointKind {
    /// Every kind, in the order they are written.
    pub const ALL: [CheckpointKind; 4] = [
        CheckpointKind::Transitions,
        CheckpointKind::Weights,
        CheckpointKind::Energies,
        CheckpointKind::Distances,
    ];

    /// File extension appended to the basename.
    pub fn extension(&self) -> &'static str {
        match self {
            CheckpointKind::Transitions => "transitions",
            CheckpointKind::Weights => "weights",
            CheckpointKind::Energies => "energies",
            CheckpointKind::Distances => "distances",
        }
    }
}

/// Location of a checkpoint: `<directory>/<basename>.<extension>` per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointSet {
    directory: PathBuf,
    basename: String,
}

impl CheckpointSet {
    /// Names a checkpoint under `directory`.
    pub fn new(directory: impl Into<PathBuf>, basename: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            basename: basename.into(),
        }
    }

    /// Path of one checkpoint file.
    pub fn path(&self, kind: CheckpointKind) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.basename, kind.extension()))
    }

    /// Kinds a simulation in the given mode writes. Weights exist only in adaptive mode.
    pub fn kinds(simulation: &Simulation) -> Vec<CheckpointKind> {
        CheckpointKind::ALL
            .into_iter()
            .filter(|kind| *kind != CheckpointKind::Weights || simulation.mode().is_adaptive())
            .collect()
    }

    /// Writes every file of the checkpoint, creating the directory if needed.
    pub fn store(&self, simulation: &Simulation) -> Result<Vec<PathBuf>, HopError> {
        fs::create_dir_all(&self.directory).map_err(|err| {
            HopError::Io(
                ErrorInfo::new("checkpoint-mkdir", err.to_string())
                    .with_context("path", self.directory.display()),
            )
        })?;
        let mut written = Vec::new();
        for kind in Self::kinds(simulation) {
            let path = self.path(kind);
            let file = File::create(&path).map_err(|err| write_error(&path, err))?;
            let mut out = BufWriter::new(file);
            let result = match kind {
                CheckpointKind::Transitions => simulation.write_transitions(&mut out),
                CheckpointKind::Weights => simulation.write_weights(&mut out),
                CheckpointKind::Energies => simulation.write_energies(&mut out),
                CheckpointKind::Distances => simulation.write_distances(&mut out),
            };
            result
                .and_then(|_| out.flush())
                .map_err(|err| write_error(&path, err))?;
            written.push(path);
        }
        info!(directory = %self.directory.display(), basename = %self.basename, "stored checkpoint");
        Ok(written)
    }

    /// Restores every file of the checkpoint into `simulation`.
    ///
    /// All files are parsed and validated before anything is applied, so a malformed file
    /// leaves the simulation untouched.
    pub fn load(&self, simulation: &mut Simulation) -> Result<(), HopError> {
        let mut transitions = None;
        let mut weights = None;
        let mut energies = None;
        let mut distances = None;
        for kind in Self::kinds(simulation) {
            let path = self.path(kind);
            let file = File::open(&path).map_err(|err| {
                HopError::Io(
                    ErrorInfo::new("checkpoint-open", err.to_string())
                        .with_context("path", path.display()),
                )
            })?;
            let reader = BufReader::new(file);
            let tag = |err: HopError| tag_path(err, &path);
            match kind {
                CheckpointKind::Transitions => {
                    transitions = Some(simulation.parse_transitions(reader).map_err(tag)?)
                }
                CheckpointKind::Weights => {
                    weights = Some(simulation.parse_weights(reader).map_err(tag)?)
                }
                CheckpointKind::Energies => {
                    energies = Some(simulation.parse_energies(reader).map_err(tag)?)
                }
                CheckpointKind::Distances => {
                    distances = Some(simulation.parse_distances(reader).map_err(tag)?)
                }
            }
        }
        if let Some(rows) = transitions {
            simulation.apply_transitions(rows);
        }
        if let Some(parsed) = weights {
            simulation.apply_weights(parsed);
        }
        if let Some(rows) = energies {
            simulation.apply_energies(rows);
        }
        if let Some(parsed) = distances {
            simulation.apply_distances(parsed);
        }
        info!(directory = %self.directory.display(), basename = %self.basename, "loaded checkpoint");
        Ok(())
    }
}

fn write_error(path: &Path, err: std::io::Error) -> HopError {
    HopError::Io(ErrorInfo::new("checkpoint-write", err.to_string()).with_context("path", path.display()))
}

fn tag_path(err: HopError, path: &Path) -> HopError {
    match err {
        HopError::MalformedCheckpoint(info) => {
            HopError::MalformedCheckpoint(info.with_context("path", path.display()))
        }
        HopError::Io(info) => HopError::Io(info.with_context("path", path.display())),
        other => other,
    }
}

fn malformed(code: &str, message: &str, line: &DataLine) -> HopError {
    HopError::MalformedCheckpoint(ErrorInfo::new(code, message).with_line(line.number, &line.text))
}

struct DataLine {
    number: usize,
    text: String,
}

impl DataLine {
    fn tokens(&self) -> Vec<&str> {
        self.text.split_whitespace().collect()
    }
}

/// Header and data rows of a checkpoint file: the first non-blank line is the header, `#`
/// lines are comments.
fn checkpoint_lines<R: BufRead>(input: R) -> Result<(Option<DataLine>, Vec<DataLine>), HopError> {
    let mut header = None;
    let mut rows = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let text = line.map_err(|err| {
            HopError::Io(ErrorInfo::new("checkpoint-read", err.to_string()).with_context("line", index + 1))
        })?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if header.is_none() {
            header = Some(DataLine {
                number: index + 1,
                text,
            });
            continue;
        }
        if trimmed.starts_with('#') {
            continue;
        }
        rows.push(DataLine {
            number: index + 1,
            text,
        });
    }
    Ok((header, rows))
}

fn data_lines<R: BufRead>(input: R) -> Result<Vec<DataLine>, HopError> {
    checkpoint_lines(input).map(|(_, rows)| rows)
}

fn expect_columns<'a>(line: &'a DataLine, expected: usize) -> Result<Vec<&'a str>, HopError> {
    let tokens = line.tokens();
    if tokens.len() != expected {
        return Err(HopError::MalformedCheckpoint(
            ErrorInfo::new("column-count", "unexpected number of columns")
                .with_line(line.number, &line.text)
                .with_context("expected", expected)
                .with_context("found", tokens.len()),
        ));
    }
    Ok(tokens)
}

fn parse_count(token: &str, line: &DataLine) -> Result<u64, HopError> {
    token
        .parse::<u64>()
        .map_err(|_| malformed("count-token", "expected a non-negative integer count", line))
}

pub(crate) struct ParsedWeights {
    rows: Vec<(usize, f64)>,
    peak: usize,
}

pub(crate) enum ParsedDistances {
    PerEnergy(Vec<(usize, u64, u64)>),
    Pooled(Option<(u64, u64)>),
}

impl Simulation {
    fn parse_energy(&self, token: &str, line: &DataLine) -> Result<usize, HopError> {
        let raw = token
            .parse::<i64>()
            .map_err(|_| malformed("energy-token", "expected an integer energy", line))?;
        self.network
            .constants()
            .checked_index_of(raw)
            .ok_or_else(|| malformed("energy-off-lattice", "energy is not a reachable level", line))
    }

    fn header(&self, kind: CheckpointKind) -> String {
        let network = &self.network;
        format!(
            "hopfield {} nodes={} patterns={} energy_scale={} max_energy={} max_energy_change={}",
            kind.extension(),
            network.nodes(),
            network.patterns().len(),
            network.energy_scale(),
            network.max_energy(),
            network.max_energy_change()
        )
    }

    /// Writes the transition histogram, one row per energy with recorded moves.
    pub fn write_transitions<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let max_change = self.network.max_energy_change();
        writeln!(out, "{}", self.header(CheckpointKind::Transitions))?;
        write!(out, "# energy")?;
        for change in -max_change..=max_change {
            write!(out, " t[{change:+}]")?;
        }
        writeln!(out)?;
        for energy in 0..self.energy_range() {
            if self.transitions_from(energy) == 0 {
                continue;
            }
            write!(out, "{}", self.network.actual_energy(energy))?;
            for change in -max_change..=max_change {
                write!(out, " {}", self.transitions(energy, change))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    pub(crate) fn parse_transitions<R: BufRead>(
        &self,
        input: R,
    ) -> Result<Vec<(usize, Vec<u64>)>, HopError> {
        let width = 2 * self.network.max_energy_change() as usize + 1;
        data_lines(input)?
            .iter()
            .map(|line| {
                let tokens = expect_columns(line, width + 1)?;
                let energy = self.parse_energy(tokens[0], line)?;
                let counts = tokens[1..]
                    .iter()
                    .map(|token| parse_count(token, line))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((energy, counts))
            })
            .collect()
    }

    pub(crate) fn apply_transitions(&mut self, rows: Vec<(usize, Vec<u64>)>) {
        let width = 2 * self.network.max_energy_change() as usize + 1;
        for (energy, counts) in rows {
            self.transitions[energy * width..(energy + 1) * width].copy_from_slice(&counts);
        }
    }

    /// Restores transition rows. Rows absent from the file are left unchanged.
    pub fn read_transitions<R: BufRead>(&mut self, input: R) -> Result<usize, HopError> {
        let rows = self.parse_transitions(input)?;
        let applied = rows.len();
        self.apply_transitions(rows);
        debug!(rows = applied, "restored transitions");
        Ok(applied)
    }

    /// Writes the adaptive weights of every observed energy at round-trip precision. The header
    /// records the entropy peak.
    pub fn write_weights<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(
            out,
            "{} entropy_peak={}",
            self.header(CheckpointKind::Weights),
            self.network.actual_energy(self.entropy_peak)
        )?;
        writeln!(out, "# energy ln_weight")?;
        for energy in 0..self.energy_range() {
            if self.energy_histogram[energy] == 0 {
                continue;
            }
            writeln!(
                out,
                "{} {:e}",
                self.network.actual_energy(energy),
                self.ln_weights[energy]
            )?;
        }
        Ok(())
    }

    pub(crate) fn parse_weights<R: BufRead>(&self, input: R) -> Result<ParsedWeights, HopError> {
        self.require_adaptive("read_weights")?;
        let (header, lines) = checkpoint_lines(input)?;
        let recorded_peak = match &header {
            Some(line) => self.header_peak(line)?,
            None => None,
        };
        let mut rows = Vec::with_capacity(lines.len());
        for line in &lines {
            let tokens = expect_columns(line, 2)?;
            let energy = self.parse_energy(tokens[0], line)?;
            let weight = tokens[1]
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| malformed("weight-token", "expected a finite weight", line))?;
            rows.push((energy, weight));
        }
        rows.sort_by_key(|(energy, _)| *energy);
        let peak = recorded_peak.or_else(|| infer_peak(&rows)).ok_or_else(|| {
            HopError::MalformedCheckpoint(
                ErrorInfo::new("missing-peak", "no zero weight marks the entropy peak")
                    .with_context("rows", rows.len()),
            )
        })?;
        Ok(ParsedWeights { rows, peak })
    }

    pub(crate) fn apply_weights(&mut self, parsed: ParsedWeights) {
        for (energy, weight) in parsed.rows {
            self.ln_weights[energy] = weight;
        }
        self.entropy_peak = parsed.peak;
    }

    fn header_peak(&self, header: &DataLine) -> Result<Option<usize>, HopError> {
        header
            .tokens()
            .into_iter()
            .find_map(|token| token.strip_prefix("entropy_peak="))
            .map(|token| self.parse_energy(token, header))
            .transpose()
    }

    /// Restores weights and the entropy peak. Adaptive only.
    ///
    /// The peak comes from the header's `entropy_peak=` field; files without it fall back to
    /// the zero-weight rows.
    pub fn read_weights<R: BufRead>(&mut self, input: R) -> Result<usize, HopError> {
        let parsed = self.parse_weights(input)?;
        let applied = parsed.rows.len();
        self.apply_weights(parsed);
        debug!(rows = applied, peak = self.entropy_peak, "restored weights");
        Ok(applied)
    }

    /// Writes the energy histogram, with the sample column in adaptive mode.
    pub fn write_energies<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let adaptive = self.mode.is_adaptive();
        writeln!(out, "{}", self.header(CheckpointKind::Energies))?;
        if adaptive {
            writeln!(out, "# energy count samples")?;
        } else {
            writeln!(out, "# energy count")?;
        }
        for energy in 0..self.energy_range() {
            let count = self.energy_histogram[energy];
            let samples = self.visits.samples()[energy];
            if count == 0 && samples == 0 {
                continue;
            }
            let actual = self.network.actual_energy(energy);
            if adaptive {
                writeln!(out, "{actual} {count} {samples}")?;
            } else {
                writeln!(out, "{actual} {count}")?;
            }
        }
        Ok(())
    }

    pub(crate) fn parse_energies<R: BufRead>(
        &self,
        input: R,
    ) -> Result<Vec<(usize, u64, u64)>, HopError> {
        let adaptive = self.mode.is_adaptive();
        data_lines(input)?
            .iter()
            .map(|line| {
                let tokens = expect_columns(line, if adaptive { 3 } else { 2 })?;
                let energy = self.parse_energy(tokens[0], line)?;
                let count = parse_count(tokens[1], line)?;
                let samples = if adaptive {
                    parse_count(tokens[2], line)?
                } else {
                    0
                };
                Ok((energy, count, samples))
            })
            .collect()
    }

    pub(crate) fn apply_energies(&mut self, rows: Vec<(usize, u64, u64)>) {
        let adaptive = self.mode.is_adaptive();
        for (energy, count, samples) in rows {
            self.energy_histogram[energy] = count;
            if adaptive {
                self.visits.set_samples(energy, samples);
            }
        }
    }

    /// Restores energy histogram rows (and sample counts in adaptive mode).
    pub fn read_energies<R: BufRead>(&mut self, input: R) -> Result<usize, HopError> {
        let rows = self.parse_energies(input)?;
        let applied = rows.len();
        self.apply_energies(rows);
        debug!(rows = applied, "restored energy histogram");
        Ok(applied)
    }

    /// Writes the pattern distance accumulators.
    pub fn write_distances<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}", self.header(CheckpointKind::Distances))?;
        match &self.distances {
            DistanceLog::PerEnergy { records, sums } => {
                writeln!(out, "# energy records distance_sum")?;
                for energy in 0..self.energy_range() {
                    if records[energy] == 0 {
                        continue;
                    }
                    writeln!(
                        out,
                        "{} {} {}",
                        self.network.actual_energy(energy),
                        records[energy],
                        sums[energy]
                    )?;
                }
            }
            DistanceLog::Pooled { records, sum } => {
                writeln!(out, "# records distance_sum")?;
                writeln!(out, "{records} {sum}")?;
            }
        }
        Ok(())
    }

    pub(crate) fn parse_distances<R: BufRead>(
        &self,
        input: R,
    ) -> Result<ParsedDistances, HopError> {
        let lines = data_lines(input)?;
        match &self.distances {
            DistanceLog::PerEnergy { .. } => lines
                .iter()
                .map(|line| {
                    let tokens = expect_columns(line, 3)?;
                    Ok((
                        self.parse_energy(tokens[0], line)?,
                        parse_count(tokens[1], line)?,
                        parse_count(tokens[2], line)?,
                    ))
                })
                .collect::<Result<Vec<_>, HopError>>()
                .map(ParsedDistances::PerEnergy),
            DistanceLog::Pooled { .. } => {
                if let Some(extra) = lines.get(1) {
                    return Err(malformed(
                        "extra-rows",
                        "pooled distances hold a single row",
                        extra,
                    ));
                }
                let Some(line) = lines.first() else {
                    return Ok(ParsedDistances::Pooled(None));
                };
                let tokens = expect_columns(line, 2)?;
                Ok(ParsedDistances::Pooled(Some((
                    parse_count(tokens[0], line)?,
                    parse_count(tokens[1], line)?,
                ))))
            }
        }
    }

    pub(crate) fn apply_distances(&mut self, parsed: ParsedDistances) {
        match (&mut self.distances, parsed) {
            (DistanceLog::PerEnergy { records, sums }, ParsedDistances::PerEnergy(rows)) => {
                for (energy, count, sum) in rows {
                    records[energy] = count;
                    sums[energy] = sum;
                }
            }
            (DistanceLog::Pooled { records, sum }, ParsedDistances::Pooled(Some(row))) => {
                *records = row.0;
                *sum = row.1;
            }
            _ => {}
        }
    }

    /// Restores the pattern distance accumulators.
    pub fn read_distances<R: BufRead>(&mut self, input: R) -> Result<usize, HopError> {
        let parsed = self.parse_distances(input)?;
        let applied = match &parsed {
            ParsedDistances::PerEnergy(rows) => rows.len(),
            ParsedDistances::Pooled(row) => usize::from(row.is_some()),
        };
        self.apply_distances(parsed);
        debug!(rows = applied, "restored distances");
        Ok(applied)
    }
}

/// Entropy peak implied by weight rows sorted by energy.
///
/// Weights are zero on the flat side of the peak, so the zero rows form a run reaching one end
/// of the observed range; the peak is its inner end. A lone zero row elsewhere is the peak.
fn infer_peak(rows: &[(usize, f64)]) -> Option<usize> {
    let is_zero = |row: &&(usize, f64)| row.1 == 0.0;
    if rows.last().is_some_and(|row| row.1 == 0.0) {
        return rows.iter().rev().take_while(is_zero).last().map(|row| row.0);
    }
    if rows.first().is_some_and(|row| row.1 == 0.0) {
        return rows.iter().take_while(is_zero).last().map(|row| row.0);
    }
    rows.iter().find(is_zero).map(|row| row.0)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::infer_peak;
    use crate::simulation::{SamplingMode, Simulation};
    use hop_net::{parse_pattern, HopfieldNetwork};

    fn network() -> HopfieldNetwork {
        HopfieldNetwork::new(&[parse_pattern("1100").unwrap(), parse_pattern("1010").unwrap()])
            .unwrap()
    }

    #[test]
    fn header_peak_wins_over_a_zero_weight_above_it() {
        let mut original =
            Simulation::new(network(), vec![true, true, false, false], SamplingMode::Adaptive)
                .unwrap();
        // the energy above the peak was seen once and inherited the peak's value
        original.energy_histogram = vec![3, 4, 1];
        original.ln_dos = vec![-1.0, 0.0, 0.0];
        original.entropy_peak = 1;
        original.compute_weights_from_dos(-5.0).unwrap();
        assert!(original.ln_weights().iter().all(|&weight| weight == 0.0));

        let mut text = Vec::new();
        original.write_weights(&mut text).unwrap();
        let mut restored =
            Simulation::new(network(), vec![false; 4], SamplingMode::Adaptive).unwrap();
        assert_eq!(restored.read_weights(Cursor::new(text)).unwrap(), 3);
        assert_eq!(restored.entropy_peak(), 1);
    }

    #[test]
    fn header_peak_must_be_on_the_lattice() {
        let mut simulation =
            Simulation::new(network(), vec![false; 4], SamplingMode::Adaptive).unwrap();
        let bad = format!(
            "hopfield weights entropy_peak=x\n{} 0e0\n",
            simulation.network().actual_energy(0)
        );
        let err = simulation.read_weights(Cursor::new(bad)).unwrap_err();
        assert_eq!(err.info().code, "energy-token");
        assert_eq!(err.info().context.get("line").map(String::as_str), Some("1"));
    }

    #[test]
    fn peak_is_the_inner_end_of_the_top_run() {
        let rows = [(0, 2.5), (1, 1.0), (2, 0.0), (3, 0.0), (4, 0.0)];
        assert_eq!(infer_peak(&rows), Some(2));
    }

    #[test]
    fn peak_is_the_inner_end_of_the_bottom_run() {
        let rows = [(0, 0.0), (1, 0.0), (3, 0.7), (4, 1.9)];
        assert_eq!(infer_peak(&rows), Some(1));
    }

    #[test]
    fn lone_zero_row_is_the_peak() {
        let rows = [(0, 2.0), (1, 0.0), (2, 1.0)];
        assert_eq!(infer_peak(&rows), Some(1));
        assert_eq!(infer_peak(&[(0, 1.0)]), None);
    }
}
