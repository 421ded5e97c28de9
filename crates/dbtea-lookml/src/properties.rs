//! Declared LookML property names per record kind
//!
//! Translation only ever emits keys listed here. Lookup is case-sensitive.

macro_rules! property_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $key:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Every permitted property
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// LookML key for this property
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $key,)+
                }
            }

            /// Exact-match lookup of a LookML key
            pub fn parse(key: &str) -> Option<Self> {
                match key {
                    $($key => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn is_valid(key: &str) -> bool {
                Self::parse(key).is_some()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

property_enum! {
    /// Keys permitted on a view record
    ViewProperty {
        Name => "name",
        Label => "label",
        Extends => "extends",
        Extension => "extension",
        SqlTableName => "sql_table_name",
        DerivedTable => "derived_table",
        RequiredAccessGrants => "required_access_grants",
        Suggestions => "suggestions",
        Parameters => "parameters",
        Parameter => "parameter",
        Dimensions => "dimensions",
        Dimension => "dimension",
        DimensionGroups => "dimension_groups",
        DimensionGroup => "dimension_group",
        Measures => "measures",
        Measure => "measure",
        Sets => "sets",
        Set => "set",
    }
}

property_enum! {
    /// Keys permitted on a dimension or dimension group record
    DimensionProperty {
        Name => "name",
        Action => "action",
        AllowFill => "allow_fill",
        AlphaSort => "alpha_sort",
        BypassSuggestRestrictions => "bypass_suggest_restrictions",
        CanFilter => "can_filter",
        Case => "case",
        CaseSensitive => "case_sensitive",
        Datatype => "datatype",
        DrillFields => "drill_fields",
        EndLocationField => "end_location_field",
        FanoutOn => "fanout_on",
        FullSuggestions => "full_suggestions",
        GroupLabel => "group_label",
        GroupItemLabel => "group_item_label",
        Html => "html",
        LabelFromParameter => "label_from_parameter",
        Link => "link",
        MapLayerName => "map_layer_name",
        OrderByField => "order_by_field",
        PrimaryKey => "primary_key",
        RequiredFields => "required_fields",
        SkipDrillFilter => "skip_drill_filter",
        StartLocationField => "start_location_field",
        Suggestions => "suggestions",
        SuggestPersistFor => "suggest_persist_for",
        Style => "style",
        Sql => "sql",
        SqlEnd => "sql_end",
        SqlStart => "sql_start",
        Tiers => "tiers",
        SqlLongitude => "sql_longitude",
        SqlLatitude => "sql_latitude",
        StringDatatype => "string_datatype",
        Units => "units",
        ValueFormat => "value_format",
        ValueFormatName => "value_format_name",
        Alias => "alias",
        ConvertTz => "convert_tz",
        Description => "description",
        Hidden => "hidden",
        Label => "label",
        RequiredAccessGrants => "required_access_grants",
        Suggestable => "suggestable",
        Tags => "tags",
        Type => "type",
        SuggestDimension => "suggest_dimension",
        SuggestExplore => "suggest_explore",
        ViewLabel => "view_label",
    }
}

/// Field types that become dimension groups instead of dimensions
pub const DIMENSION_GROUP_TYPES: &[&str] = &["duration", "time"];

/// Whether a field of `field_type` belongs in `dimension_groups`
pub fn is_dimension_group_type(field_type: &str) -> bool {
    DIMENSION_GROUP_TYPES.contains(&field_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact() {
        assert_eq!(ViewProperty::parse("sql_table_name"), Some(ViewProperty::SqlTableName));
        assert!(ViewProperty::is_valid("measures"));
        assert!(ViewProperty::is_valid("dimension_group"));
        assert!(!ViewProperty::is_valid("Name"));
        assert!(!ViewProperty::is_valid("columns"));
        assert!(!ViewProperty::is_valid("meta"));
        assert!(!ViewProperty::is_valid("alias"));

        assert!(DimensionProperty::is_valid("alias"));
        assert!(!DimensionProperty::is_valid("tests"));
        assert!(!DimensionProperty::is_valid("data_type"));
    }

    #[test]
    fn all_round_trips_through_parse() {
        for property in ViewProperty::ALL {
            assert_eq!(ViewProperty::parse(property.as_str()), Some(*property));
        }
        for property in DimensionProperty::ALL {
            assert_eq!(DimensionProperty::parse(property.as_str()), Some(*property));
        }
    }

    #[test]
    fn dimension_group_types() {
        assert!(is_dimension_group_type("time"));
        assert!(is_dimension_group_type("duration"));
        assert!(!is_dimension_group_type("timestamp"));
        assert!(!is_dimension_group_type("Time"));
    }
}
