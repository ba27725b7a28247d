//! The station and basin extraction pipeline.
//!
//! One run resolves the gauge's basin, builds a point series at the station and a summed
//! series over the basin, prefixes their columns and submits both to a [`TableSink`].
//! The two branches share nothing but the read-only parameters.

use crate::basin::feature_catalog::FeatureCatalog;
use crate::basin::resolver::resolve_basin;
use crate::error::Era5Error;
use crate::export::sink::{ExportTable, JobHandle, TableSink};
use crate::series::catalog::ImageCatalog;
use crate::series::error::ExtractError;
use crate::series::query::{Reducer, SeriesQuery};
use crate::series::rename::rename;
use crate::types::geometry::Geometry;
use crate::types::parameters::QueryParameters;
use log::info;

/// Both extraction queries of a run, ready to be materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelinePlan {
    pub station: SeriesQuery,
    pub basin: SeriesQuery,
}

/// The jobs a run submitted. Their progress is reported by the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineJobs {
    pub station: JobHandle,
    pub basin: JobHandle,
}

/// Wires the parameters to a basin catalog, an image catalog and an export sink.
pub struct Era5LandPipeline<'a, F, I, S>
where
    F: FeatureCatalog + ?Sized,
    I: ImageCatalog + ?Sized,
    S: TableSink + ?Sized,
{
    params: QueryParameters,
    basins: &'a F,
    images: &'a I,
    sink: &'a S,
}

impl<'a, F, I, S> Era5LandPipeline<'a, F, I, S>
where
    F: FeatureCatalog + ?Sized,
    I: ImageCatalog + ?Sized,
    S: TableSink + ?Sized,
{
    pub fn new(params: QueryParameters, basins: &'a F, images: &'a I, sink: &'a S) -> Self {
        Self {
            params,
            basins,
            images,
            sink,
        }
    }

    pub fn params(&self) -> &QueryParameters {
        &self.params
    }

    /// First-cell sample at the station point.
    pub fn station_query(&self) -> Result<SeriesQuery, ExtractError> {
        SeriesQuery::builder()
            .geometry(Geometry::Point(self.params.station_point()))
            .dates(self.params.dates())
            .variables(self.params.variables().to_vec())
            .reducer(Reducer::First)
            .scale_m(self.params.station_scale_m())
            .build()
    }

    /// Sum over `basin` under the run's pixel budget.
    pub fn basin_query(&self, basin: Geometry) -> Result<SeriesQuery, ExtractError> {
        SeriesQuery::builder()
            .geometry(basin)
            .dates(self.params.dates())
            .variables(self.params.variables().to_vec())
            .reducer(Reducer::Sum)
            .scale_m(self.params.basin_scale_m())
            .best_effort(self.params.best_effort())
            .max_pixels(self.params.max_pixels())
            .build()
    }

    /// Resolves the basin and describes both extractions without computing anything.
    pub fn plan(&self) -> Result<PipelinePlan, Era5Error> {
        let basin = resolve_basin(
            self.basins,
            self.params.gauge_id(),
            self.params.simplify_tolerance_m(),
        )?;
        Ok(PipelinePlan {
            station: self.station_query()?,
            basin: self.basin_query(basin)?,
        })
    }

    /// Lazy, renamed export tables for both branches of `plan`.
    pub fn tables(&self, plan: &PipelinePlan) -> Result<(ExportTable, ExportTable), Era5Error> {
        let variables = self.params.variables();
        let station = rename(
            plan.station.materialize(self.images)?,
            self.params.station_prefix(),
            variables,
        )?;
        let basin = rename(
            plan.basin.materialize(self.images)?,
            self.params.basin_prefix(),
            variables,
        )?;
        Ok((
            ExportTable::csv(station, self.params.station_description(), self.params.folder()),
            ExportTable::csv(basin, self.params.basin_description(), self.params.folder()),
        ))
    }

    /// Plans the run and submits both exports, station first.
    ///
    /// Returns as soon as both jobs are submitted. Failures while planning abort the
    /// run before anything is submitted; failures inside a job only show up in the
    /// sink's job status.
    pub fn run(&self) -> Result<PipelineJobs, Era5Error> {
        let plan = self.plan()?;
        let (station_table, basin_table) = self.tables(&plan)?;
        let station = self.sink.submit(station_table)?;
        let basin = self.sink.submit(basin_table)?;
        info!(
            "Submitted {} ({}) and {} ({}) for gauge {} over {}",
            station.description(),
            station.id(),
            basin.description(),
            basin.id(),
            self.params.gauge_id(),
            self.params.dates()
        );
        Ok(PipelineJobs { station, basin })
    }
}
