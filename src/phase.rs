use thiserror::Error ;



/// The lifecycle phase a class is transformed in.
///
/// Phases are totally ordered: [`Load`]( Self::Load ) runs when a class is first
/// activated, [`Weave`]( Self::Weave ) runs when the weaving engine asks for a class
/// representation to inject into. Every [`TransformationService`]( crate::TransformationService )
/// reports a priority per phase, so eligibility is decided independently for each.
#[derive( Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash )]
pub enum TransformPhase {
    /// Applied while the loader activates a class for the first time.
    Load,
    /// Applied while the weaving engine introspects a class before injection.
    Weave,
}

impl TransformPhase {

    /// Every phase, in lifecycle order.
    pub const ALL: [Self; 2] = [ Self::Load, Self::Weave ];

    /// Stable identifier as consumed by weaving engine adapters.
    #[inline] pub const fn as_str( self ) -> &'static str {
        match self {
            Self::Load => "LOAD",
            Self::Weave => "WEAVE",
        }
    }

    #[inline] pub(crate) const fn index( self ) -> usize {
        match self {
            Self::Load => 0,
            Self::Weave => 1,
        }
    }

}

impl std::fmt::Display for TransformPhase {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result { f.write_str( self.as_str() )}
}

/// The string did not name a [`TransformPhase`].
#[derive( Debug, Error, PartialEq, Eq )]
#[error( "Unknown transformation phase: {0}" )]
pub struct UnknownPhase( pub String );

impl std::str::FromStr for TransformPhase {
    type Err = UnknownPhase ;
    fn from_str( s: &str ) -> Result<Self, Self::Err> {
        Self::ALL.into_iter()
            .find(| phase | phase.as_str().eq_ignore_ascii_case( s.trim() ))
            .ok_or_else(|| UnknownPhase( s.to_string() ))
    }
}
