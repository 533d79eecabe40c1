//! Keyword table used to read pod membership out of free-text comments.
//!
//! Matching is a plain case-sensitive substring test against each entry, so
//! results are reproducible but fuzzy. Known misfires: short tokens such as
//! `Js`, `Ks` and `Ls` fire inside unrelated words ("Jsomething", "Ls
//! sighted" in a list of initials), and a comment that names a whale from
//! another pod in passing flags that pod too. Comments that spell a pod in a
//! way not listed here ("Jay pod") are missed. Keep the lists as they are;
//! changing them changes historical counts.

use crate::sighting::{Pod, PodSet};

/// Keywords that flag one pod.
#[derive(Debug, Clone, Copy)]
pub struct PodKeywords {
    pub pod: Pod,
    pub keywords: &'static [&'static str],
}

const J_KEYWORDS: &[&str] = &[
    "J pod", "Jpod", "J ppd", "J-pod", "Js", "j pod", "jpod", "j ppd", "j-pod", "j+k", "k+j",
    "j & k", "k & j", "j and k", "k and j", "jk pods", "kj pods", "J+K", "K+J", "J & K", "K & J",
    "J and K", "K and J", "JK pods", "KJ pods", "j+l", "l+j", "j & l", "l & j", "j and l",
    "l and j", "jl pods", "lj pods", "J+L", "L+J", "J & L", "L & J", "J and L", "L and J",
    "JL pods", "LJ pods", "j, k, l pod", "j, k, and l pod", "jkl", "J, K, L pod",
    "J, K, and L pod", "JKL", "j27", "j38", "j35", "j40", "J27", "J38", "J35", "J40",
];

const K_KEYWORDS: &[&str] = &[
    "K pod", "Kpod", "K-pod", "Ks", "k pod", "kpod", "k-pod", "j+k", "k+j", "j & k", "k & j",
    "j and k", "k and j", "jk pods", "kj pods", "J+K", "K+J", "J & K", "K & J", "J and K",
    "K and J", "JK pods", "KJ pods", "k+l", "l+k", "k & l", "l & k", "k and l", "l and k",
    "lk pods", "kl pods", "K+L", "L+K", "K & L", "L & K", "K and L", "L and K", "LK pods",
    "KL pods", "j, k, l pod", "j, k, and l pod", "jkl", "J, K, L pod", "J, K, and L pod", "JKL",
    "k37", "K37",
];

const L_KEYWORDS: &[&str] = &[
    "L pod", "Lpod", "L-pod", "Ls", "j+l", "l+j", "j & l", "l & j", "j and l", "l and j",
    "jl pods", "lj pods", "J+L", "L+J", "J & L", "L & J", "J and L", "L and J", "JL pods",
    "LJ pods", "k+l", "l+k", "k & l", "l & k", "k and l", "l and k", "lk pods", "kl pods", "K+L",
    "L+K", "K & L", "L & K", "K and L", "L and K", "LK pods", "KL pods", "j, k, l pod",
    "j, k, and l pod", "jkl", "J, K, L pod", "J, K, and L pod", "JKL", "l12", "l54", "l-12",
    "l82", "l85", "l87", "L12", "L54", "L-12", "L82", "L85", "L87",
];

pub const POD_KEYWORD_TABLE: [PodKeywords; 3] = [
    PodKeywords {
        pod: Pod::J,
        keywords: J_KEYWORDS,
    },
    PodKeywords {
        pod: Pod::K,
        keywords: K_KEYWORDS,
    },
    PodKeywords {
        pod: Pod::L,
        keywords: L_KEYWORDS,
    },
];

/// Pods whose keyword list has at least one entry inside `comment`.
pub fn pods_from_comment(comment: &str) -> PodSet {
    POD_KEYWORD_TABLE
        .iter()
        .filter(|entry| mentions(entry, comment))
        .map(|entry| entry.pod)
        .collect()
}

fn mentions(entry: &PodKeywords, comment: &str) -> bool {
    entry.keywords.iter().any(|keyword| comment.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pod_phrases() {
        assert_eq!(pods_from_comment("J pod heading north"), PodSet::only(Pod::J));
        assert_eq!(pods_from_comment("saw kpod off the point"), PodSet::only(Pod::K));
        assert_eq!(pods_from_comment("L-pod foraging"), PodSet::only(Pod::L));
    }

    #[test]
    fn test_combined_pod_phrases() {
        let flags = pods_from_comment("J and K together");
        assert!(flags.contains(Pod::J));
        assert!(flags.contains(Pod::K));
        assert!(!flags.contains(Pod::L));
        assert_eq!(pods_from_comment("JKL superpod").len(), 3);
    }

    #[test]
    fn test_individual_whale_ids() {
        assert_eq!(pods_from_comment("J35 and calf"), PodSet::only(Pod::J));
        assert_eq!(pods_from_comment("L87 travelling with Js"), {
            let mut flags = PodSet::only(Pod::J);
            flags.insert(Pod::L);
            flags
        });
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        // "JPOD" is not in the table in that casing
        assert!(pods_from_comment("JPOD").is_empty());
        assert!(pods_from_comment("orcas, transients").is_empty());
    }

    #[test]
    fn test_known_false_positive_is_reproduced() {
        // "Ls" inside an unrelated word still flags L pod
        assert_eq!(pods_from_comment("Lsomething odd"), PodSet::only(Pod::L));
    }
}
