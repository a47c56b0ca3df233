//! Display helpers for result counts.

const SMALL_COUNT: usize = 10;

/// Nudges a count away from round numbers. Stable for the same input.
///
/// Counts of ten or fewer are returned as is, so a short list is never
/// overstated. Above that, multiples of ten move by +2 or -3, most multiples
/// of five by +1, and every count then shifts by -2..=2 derived from the count
/// itself.
///
/// ```
/// use petplates_engine::organic::make_count_organic;
///
/// assert_eq!(make_count_organic(40), 42);
/// assert_eq!(make_count_organic(40), make_count_organic(40));
/// assert_eq!(make_count_organic(3), 3);
/// ```
pub fn make_count_organic(count: usize) -> usize {
    if count <= SMALL_COUNT {
        return count;
    }

    let count = count as i64;
    let seed = count * 17 + 23;
    let mut organic = count;

    if count % 10 == 0 {
        organic = count + if seed % 2 == 0 { 2 } else { -3 };
    }
    if count % 5 == 0 && seed % 10 > 2 {
        organic = count + 1;
    }
    organic += seed % 5 - 2;

    organic.max(1) as usize
}

/// Headline for a result count.
pub fn count_message(count: usize) -> String {
    match count {
        c if c > 60 => format!("Amazing! We found {c} perfect meals"),
        c if c > 40 => format!("Great news! We found {c} excellent meals"),
        c if c > 25 => format!("We found {c} great meal options"),
        c if c > 15 => format!("We found {c} good meal options"),
        c if c > 5 => format!("We found {c} suitable meals"),
        1 => "We found 1 meal option".to_string(),
        c => format!("We found {c} meal options"),
    }
}

/// Secondary line shown under [`count_message`].
pub fn count_subtext(count: usize, species: &str) -> String {
    match count {
        c if c > 50 => format!("That's a lot of options! Your {species} is going to love these."),
        c if c > 30 => format!("Plenty of variety for your {species}."),
        c if c > 15 => format!("Good selection for your {species}'s needs."),
        c if c > 5 => format!("Curated selection based on your {species}'s profile."),
        _ => "Limited options due to specific dietary requirements.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_counts_move() {
        assert_eq!(make_count_organic(40), 42);
        assert_eq!(make_count_organic(50), 52);
    }

    #[test]
    fn small_counts_are_exact() {
        assert!((0..=10).all(|c| make_count_organic(c) == c));
        assert_eq!(count_message(make_count_organic(3)), "We found 3 meal options");
    }

    #[test]
    fn large_counts_stay_close() {
        assert!((11..200).all(|c| make_count_organic(c).abs_diff(c) <= 5));
    }

    #[test]
    fn messages_by_threshold() {
        assert_eq!(count_message(61), "Amazing! We found 61 perfect meals");
        assert_eq!(count_message(26), "We found 26 great meal options");
        assert_eq!(count_message(6), "We found 6 suitable meals");
        assert_eq!(count_message(1), "We found 1 meal option");
        assert_eq!(count_message(0), "We found 0 meal options");
    }

    #[test]
    fn subtext_names_the_pet() {
        assert_eq!(count_subtext(31, "dog"), "Plenty of variety for your dog.");
        assert_eq!(
            count_subtext(2, "cat"),
            "Limited options due to specific dietary requirements."
        );
    }
}
