//! Flat text dumps of a computed inversion.
//!
//! The input file is echoed as a comment block ahead of the data so that every
//! output carries the parameters that produced it:
//! ```text
//! # This output.txt file was obtained running a
//! # simulation with these input parameters
//!
//! # [field]
//! # avg_n = 5
//! # ...
//!
//! # -------------------------------------------- #
//!
//! # [Time]     [Atomic inversion function]
//!
//!    00.00	-1.0000000000
//!    00.01	-0.9999375003
//! ```

use std::{
    fs,
    io::{ self, BufWriter, Write },
    path::{ Path, PathBuf },
};
use crate::{
    error::Result,
    simulation::Inversion,
};

const HEADER: &str
    = "# This output.txt file was obtained running a\n\
    # simulation with these input parameters\n\n";
const SEPARATOR: &str = "\n\n# -------------------------------------------- #\n\n";
const COLUMNS: &str = "# [Time]     [Atomic inversion function] \n\n";

/// Write `inversion` to `writer`, preceded by the commented-out `input`.
pub fn save_txt<W>(writer: &mut W, input: &str, inversion: &Inversion)
    -> io::Result<()>
where W: Write
{
    writer.write_all(HEADER.as_bytes())?;
    for line in input.split_inclusive('\n') {
        write!(writer, "# {}", line)?;
    }
    writer.write_all(SEPARATOR.as_bytes())?;
    writer.write_all(COLUMNS.as_bytes())?;
    for (t, w) in inversion.iter() {
        writeln!(writer, "   {:0>5}\t{:+.10}", format!("{:.2}", t), w)?;
    }
    Ok(())
}

/// Write `inversion` to `dir/label.txt`, creating `dir` if needed, and return
/// the path written to.
pub fn save_txt_file<P>(dir: P, label: &str, input: &str, inversion: &Inversion)
    -> Result<PathBuf>
where P: AsRef<Path>
{
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.txt", label));
    let mut out = BufWriter::new(fs::File::create(&path)?);
    save_txt(&mut out, input, inversion)?;
    out.flush()?;
    Ok(path)
}
