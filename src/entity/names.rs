//! Display-name pool

use rand::seq::SliceRandom;
use rand::Rng;

const NAMES: &[&str] = &[
    "Dave", "Karen", "Chad", "Steve", "Linda", "Bob", "Janet", "Mike", "Susan", "Greg", "Debra",
    "Kevin", "Pam", "Jim", "Dwight", "Angela", "Oscar", "Stanley", "Phyllis", "Toby", "Ryan",
    "Kelly", "Meredith", "Creed", "Andy", "Erin", "Gabe", "Holly", "Jan", "Roy", "Darryl",
    "Nellie", "Pete", "Clark", "Val", "Ellie", "Jordan",
];

/// Random name; duplicates across agents are allowed
pub fn random_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    NAMES.choose(rng).copied().unwrap_or("Someone").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_random_name_from_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..20 {
            let name = random_name(&mut rng);
            assert!(NAMES.contains(&name.as_str()));
        }
    }
}
