//! Prime sizing for the slot table.

pub(crate) fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    let mut div = 2usize;
    while div * div <= n {
        if n % div == 0 {
            return false;
        }
        div += 1;
    }
    true
}

/// Smallest prime `>= n`.
pub(crate) fn next_prime(mut n: usize) -> usize {
    while !is_prime(n) {
        n += 1;
    }
    n
}
