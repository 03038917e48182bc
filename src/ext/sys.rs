use std::{
    io::{self, Read, BufRead, BufReader, Write, BufWriter, stdout},
    fs::{self, File},
    path::{Path, PathBuf},
    ffi::OsStr,
};
use flate2::{
    bufread::MultiGzDecoder,
    write::GzEncoder,
    Compression,
};
use crate::Error;

/// Finds an executable, and returns Error, if executable is not available.
pub fn find_exe(p: impl AsRef<Path>) -> crate::Result<PathBuf> {
    which::which(p.as_ref()).map_err(|_| Error::NoExec(p.as_ref().to_owned()))
}

/// Opens a file for reading:
/// gzip reader if the file starts with the gzip magic number, regular text file otherwise.
pub fn open(filename: &Path) -> io::Result<Box<dyn BufRead + Send>> {
    let mut stream = BufReader::new(File::open(filename)?);
    let mut two_bytes = [0_u8; 2];
    let bytes_read = stream.read(&mut two_bytes)?;
    stream.seek_relative(-(bytes_read as i64))?;
    // Check gzip magic number.
    if two_bytes[0] == 0x1f && two_bytes[1] == 0x8b {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(stream))))
    } else {
        Ok(Box::new(stream))
    }
}

/// Creates a buffered file OR stdout if filename is `-`.
pub fn create_uncompressed(filename: &Path) -> io::Result<Box<dyn Write>> {
    if filename == OsStr::new("-") {
        Ok(Box::new(BufWriter::new(stdout())))
    } else {
        Ok(Box::new(BufWriter::new(File::create(filename)?)))
    }
}

/// Compresses an existing file into `dst` (gzip), leaving `src` in place.
pub fn gzip_file(src: &Path, dst: &Path) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(src)?);
    let mut encoder = GzEncoder::new(File::create(dst)?, Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.try_finish()
}

/// Finds all filenames with appropriate extension in the directory.
pub fn filenames_with_ext(dir: &Path, ext: impl AsRef<OsStr>) -> io::Result<Vec<PathBuf>> {
    let mut res = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && path.extension() == Some(ext.as_ref()) {
            res.push(path);
        }
    }
    Ok(res)
}

/// Returns a path with a new suffix appended to the end.
pub fn append_path(path: &Path, suffix: impl AsRef<OsStr>) -> PathBuf {
    let mut os_string = path.as_os_str().to_owned();
    os_string.push(suffix.as_ref());
    os_string.into()
}

/// Create directory and all of its parents, if they do not exist yet.
pub fn mkdir(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path)
    } else {
        Ok(())
    }
}
