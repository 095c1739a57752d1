/// Rows and columns of a small-multiples grid holding `count` panels.
///
/// With `n = floor(sqrt(count))`: `n × n` when that is exact, else `n × (n + 1)`
/// when it fits, else `(n + 1) × (n + 1)`.
pub fn grid_layout(count: usize) -> (usize, usize) {
    let count = count.max(1);
    let mut n = (count as f64).sqrt().floor() as usize;
    // Guard against sqrt rounding on large perfect squares.
    while (n + 1) * (n + 1) <= count {
        n += 1;
    }
    while n * n > count {
        n -= 1;
    }
    if count == n * n {
        (n, n)
    } else if count <= n * (n + 1) {
        (n, n + 1)
    } else {
        (n + 1, n + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_prefer_square_shapes() {
        let cases = [
            (1, (1, 1)),
            (2, (1, 2)),
            (3, (2, 2)),
            (4, (2, 2)),
            (5, (2, 3)),
            (6, (2, 3)),
            (7, (3, 3)),
            (10, (3, 4)),
            (13, (4, 4)),
        ];
        for (count, expected) in cases {
            assert_eq!(grid_layout(count), expected, "count {count}");
        }
    }

    #[test]
    fn every_layout_holds_all_panels() {
        for count in 1..200 {
            let (rows, cols) = grid_layout(count);
            assert!(rows * cols >= count);
            assert!(rows <= cols);
        }
    }
}
