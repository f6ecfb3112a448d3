use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Recursive Bayer index matrix: M(2n) = 4 * M(n) + D2 tiled in quadrants.
fn bayer(size: usize) -> Vec<Vec<u32>> {
    if size == 1 {
        return vec![vec![0]];
    }
    let half = size / 2;
    let inner = bayer(half);
    let quadrant = [[0, 2], [3, 1]];

    let mut matrix = vec![vec![0; size]; size];
    for (y, row) in matrix.iter_mut().enumerate() {
        for (x, cell) in row.iter_mut().enumerate() {
            *cell = 4 * inner[y % half][x % half] + quadrant[y / half][x / half];
        }
    }
    matrix
}

fn write_matrix(file: &mut File, name: &str, size: usize) {
    writeln!(file, "/// {size}x{size} Bayer threshold indices (0..{}).", size * size).unwrap();
    writeln!(file, "pub static {name}: [[u8; {size}]; {size}] = [").unwrap();
    for row in bayer(size) {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(file, "    [{}],", cells.join(", ")).unwrap();
    }
    writeln!(file, "];").unwrap();
    writeln!(file).unwrap();
}

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("bayer.rs");
    let mut file = File::create(&dest_path).unwrap();

    write_matrix(&mut file, "BAYER_2", 2);
    write_matrix(&mut file, "BAYER_4", 4);
    write_matrix(&mut file, "BAYER_8", 8);

    println!("cargo::rerun-if-changed=build.rs");
}
