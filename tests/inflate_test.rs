use std::collections::HashMap;
use std::io::Read;
use std::io::Result;
use std::path::{Path, PathBuf};

/// A zlib decompressor under test.
pub trait Inflate {
    fn inflate_to_vec(&self, data: &[u8]) -> Vec<u8>;
}

/// The reference decompressor.
pub struct MinizOxideInflater;

impl Inflate for MinizOxideInflater {
    fn inflate_to_vec(&self, data: &[u8]) -> Vec<u8> {
        miniz_oxide::inflate::decompress_to_vec_zlib(data).unwrap()
    }
}

/// This crate's decompressor.
pub struct ZinflateInflater;

impl Inflate for ZinflateInflater {
    fn inflate_to_vec(&self, data: &[u8]) -> Vec<u8> {
        zinflate::zlib::decode(data).unwrap()
    }
}

fn get_test_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
}

const DISPLAY_LEN: usize = 16;

fn display_data(data: &[u8]) -> String {
    data.iter()
        .take(DISPLAY_LEN)
        .map(|&b| format!("{:02x} ", b))
        .collect::<String>()
}

fn test_inflator<P>(inflater: Box<dyn Inflate>, zlib_path: P, raw_data_path: P) -> Result<()>
where
    P: AsRef<Path>,
{
    // Read the compressed data
    let mut zlib_file = std::fs::File::open(&zlib_path)?;
    let mut zlib_data = Vec::new();
    zlib_file.read_to_end(&mut zlib_data)?;

    println!(
        "ZLIB data({}):\n{}",
        zlib_data.len(),
        display_data(&zlib_data)
    );

    // Decompress with the inflater under test
    let decompressed_data = inflater.inflate_to_vec(&zlib_data);

    println!(
        "DECOMPRESSED data({}):\n{}",
        decompressed_data.len(),
        display_data(&decompressed_data)
    );

    // Read the RAW data
    let mut raw_data_file = std::fs::File::open(&raw_data_path)?;
    let mut raw_data = Vec::new();
    raw_data_file.read_to_end(&mut raw_data)?;

    println!("RAW data({}):\n{}", raw_data.len(), display_data(&raw_data));

    // Compare the DECOMPRESSED data with the RAW data
    assert_eq!(decompressed_data, raw_data);

    Ok(())
}

const DATA_FILES_CONFIG: &str = "manifest.json";

/// Get the data_files map in json format
fn get_data_files(file: &str) -> HashMap<String, String> {
    let data_files_path = get_test_dir().join(file);
    let data_files = std::fs::read_to_string(data_files_path).unwrap();
    serde_json::from_str(&data_files).unwrap()
}

#[test]
fn test_miniz_oxide_inflate() -> Result<()> {
    let data_files = get_data_files(DATA_FILES_CONFIG);
    for (raw, compressed) in data_files {
        let inflater = Box::new(MinizOxideInflater);
        let raw_data_path = get_test_dir().join(raw);
        let zlib_path = get_test_dir().join(compressed);
        test_inflator(inflater, zlib_path, raw_data_path)?;
    }
    Ok(())
}

#[test]
fn test_zinflate_inflate() -> Result<()> {
    let data_files = get_data_files(DATA_FILES_CONFIG);
    for (raw, compressed) in data_files {
        let inflater = Box::new(ZinflateInflater);
        let raw_data_path = get_test_dir().join(raw);
        let zlib_path = get_test_dir().join(compressed);
        test_inflator(inflater, zlib_path, raw_data_path)?;
    }
    Ok(())
}

#[test]
fn test_zinflate_matches_miniz_oxide() -> Result<()> {
    let data_files = get_data_files(DATA_FILES_CONFIG);
    for (_, compressed) in data_files {
        let zlib_path = get_test_dir().join(compressed);
        let mut zlib_data = Vec::new();
        std::fs::File::open(&zlib_path)?.read_to_end(&mut zlib_data)?;

        let ours = ZinflateInflater.inflate_to_vec(&zlib_data);
        let reference = MinizOxideInflater.inflate_to_vec(&zlib_data);
        assert_eq!(ours, reference);
    }
    Ok(())
}
