use super::tier::{ModelTier, OperationKind, SizeTier};

/// Parameters of one submission.
///
/// The free tier only renders up to Full HD; any larger size is downgraded
/// when the spec is built or its tier is switched to free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRequestSpec {
    size: SizeTier,
    tier: ModelTier,
    operation: OperationKind,
}

impl RenderRequestSpec {
    pub fn new(size: SizeTier, tier: ModelTier, operation: OperationKind) -> Self {
        Self {
            size: clamp_size(size, tier),
            tier,
            operation,
        }
    }

    #[inline]
    pub fn size(&self) -> SizeTier {
        self.size
    }

    #[inline]
    pub fn tier(&self) -> ModelTier {
        self.tier
    }

    #[inline]
    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    /// Switch tier, downgrading the size if it is not allowed on the new tier
    pub fn with_tier(self, tier: ModelTier) -> Self {
        Self::new(self.size, tier, self.operation)
    }

    pub fn with_size(self, size: SizeTier) -> Self {
        Self::new(size, self.tier, self.operation)
    }

    pub fn with_operation(self, operation: OperationKind) -> Self {
        Self { operation, ..self }
    }
}

impl Default for RenderRequestSpec {
    fn default() -> Self {
        Self::new(SizeTier::default(), ModelTier::default(), OperationKind::Create)
    }
}

fn clamp_size(size: SizeTier, tier: ModelTier) -> SizeTier {
    if tier == ModelTier::Free && !size.is_free_tier_size() {
        SizeTier::FullHd
    } else {
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switching_to_free_downgrades_size() {
        let spec = RenderRequestSpec::new(SizeTier::FourK, ModelTier::Pro, OperationKind::Create);
        assert_eq!(spec.size(), SizeTier::FourK);

        let free = spec.with_tier(ModelTier::Free);
        assert_eq!(free.size(), SizeTier::FullHd);
        assert_eq!(free.tier(), ModelTier::Free);

        // Switching back does not restore the old size
        assert_eq!(free.with_tier(ModelTier::Pro).size(), SizeTier::FullHd);
    }

    #[test]
    fn test_free_tier_never_holds_large_size() {
        for size in SizeTier::ALL {
            let spec = RenderRequestSpec::new(size, ModelTier::Free, OperationKind::Edit);
            assert!(spec.size().is_free_tier_size());

            let resized = RenderRequestSpec::default().with_size(size);
            assert!(resized.size().is_free_tier_size());
        }
    }

    #[test]
    fn test_free_sizes_are_kept() {
        let spec = RenderRequestSpec::new(SizeTier::MiniHd, ModelTier::Free, OperationKind::Create);
        assert_eq!(spec.size(), SizeTier::MiniHd);
        assert_eq!(spec.with_operation(OperationKind::Edit).size(), SizeTier::MiniHd);
    }
}
